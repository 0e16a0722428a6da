//! Multipart codec module for serializing form bodies
//!
//! This module turns the entries of a sealed [`FormBody`](crate::protocol::body::FormBody)
//! into `multipart/form-data` wire bytes. It is driven by
//! [`FormStream`](crate::protocol::body::FormStream), which asks for one part head at a
//! time, so nothing is serialized until the body is actually read.
//!
//! # Wire format
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="<name>"[; filename="<filename>"]\r\n
//! [Content-Type: <mime>\r\n]
//! \r\n
//! <value-bytes>\r\n
//! ... (repeat per entry) ...
//! --<boundary>--\r\n
//! ```
//!
//! # Example
//!
//! ```
//! use micro_request::codec::{MultipartEncoder, MultipartItem};
//! use micro_request::protocol::body::FormEntry;
//! use tokio_util::codec::Encoder;
//! use bytes::BytesMut;
//!
//! let mut encoder = MultipartEncoder::new("xyz");
//! let mut buffer = BytesMut::new();
//!
//! let entry = FormEntry::new("a", "1");
//! encoder.encode(MultipartItem::Part(&entry), &mut buffer).unwrap();
//! assert_eq!(&buffer[..], b"--xyz\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n");
//! ```

mod multipart;

pub use multipart::generate_boundary;
pub use multipart::MultipartEncoder;
pub use multipart::MultipartItem;
