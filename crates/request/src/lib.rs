//! An in-memory request envelope with a clonable, single-pass multipart form body
//!
//! This crate models the body side of an HTTP request without any transport:
//! a `multipart/form-data` body built from ordered entries, serialized lazily,
//! and a request envelope whose body can be read exactly once. Reading the same
//! body again is done by cloning the envelope, which shares the entries but
//! starts a new, independent read.
//!
//! # Features
//!
//! - Ordered multipart entries, text or binary with an optional filename
//! - Lazy serialization through an `http_body::Body` stream
//! - Zero-copy emission of binary values
//! - Explicit `Unread -> Reading -> Consumed` read state per envelope
//! - Clone-then-read independent of the original's read state
//! - Conversion into a standard `http::Request`
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use micro_request::protocol::body::FormBody;
//! use micro_request::protocol::{RequestEnvelope, RequestOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let form = FormBody::new();
//!     form.append("a", "1")?;
//!     form.append("b", "2")?;
//!     form.append_binary("file", Bytes::from_static(b"Hello, world!"), Some("hello.txt".into()))?;
//!
//!     let mut request = RequestEnvelope::new("http://localhost:3000", RequestOptions::new().body(form))?;
//!
//!     let cloned = request.clone().read_as_text().await?;
//!     let original = request.read_as_text().await?;
//!     assert!(cloned.contains("Hello, world!"));
//!     assert!(original.contains("Hello, world!"));
//!
//!     // the original's cursor is consumed now
//!     assert!(request.read_as_text().await.is_err());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - [`protocol`]: the request envelope, the form body and its cursors, errors
//! - [`codec`]: `multipart/form-data` framing and boundary generation
//!
//! # Error Handling
//!
//! - [`protocol::RequestError`]: Top-level error type
//! - [`protocol::BodyError`]: body mutation, consumption and encoding errors
//!
//! # Limitations
//!
//! - No transport: the crate never opens a connection or parses a response
//! - Multipart output only, form bodies are not parsed back

pub mod codec;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
