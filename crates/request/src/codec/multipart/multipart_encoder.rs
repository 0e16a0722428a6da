//! Encoder for the framing around multipart form entries
//!
//! The encoder only writes framing: boundary lines, part headers and the close
//! delimiter. Value bytes are handed out by the caller untouched, so binary
//! payloads never get copied into the frame buffer.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::protocol::body::{FormEntry, FormValue};
use crate::protocol::BodyError;

/// Room reserved for a part head on top of the boundary and the escaped names
const PART_HEAD_OVERHEAD: usize = 64;

/// A unit of multipart framing to encode.
#[derive(Debug, Clone, Copy)]
pub enum MultipartItem<'a> {
    /// The boundary line and headers that open the part for an entry
    Part(&'a FormEntry),
    /// The terminating `--<boundary>--` line
    Close,
}

/// Encoder for `multipart/form-data` framing implementing the [`Encoder`] trait.
///
/// Each encoder is bound to one boundary for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartEncoder {
    boundary: String,
}

impl MultipartEncoder {
    pub fn new(boundary: impl Into<String>) -> Self {
        Self { boundary: boundary.into() }
    }

    #[inline]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns `multipart/form-data; boundary=<boundary>`
    pub fn content_type(&self) -> Result<mime::Mime, BodyError> {
        format!("multipart/form-data; boundary={}", self.boundary)
            .parse()
            .map_err(|e: mime::FromStrError| BodyError::encoding(format!("invalid boundary {}: {e}", self.boundary)))
    }
}

impl<'a> Encoder<MultipartItem<'a>> for MultipartEncoder {
    type Error = BodyError;

    /// Encodes the framing for one item into the provided bytes buffer.
    ///
    /// # Errors
    ///
    /// Returns error if writing the content type into the buffer fails
    fn encode(&mut self, item: MultipartItem<'a>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            MultipartItem::Part(entry) => {
                let filename = entry.value().filename();
                dst.reserve(
                    self.boundary.len() + entry.name().len() + filename.map_or(0, str::len) + PART_HEAD_OVERHEAD,
                );

                dst.put_slice(b"--");
                dst.put_slice(self.boundary.as_bytes());
                dst.put_slice(b"\r\nContent-Disposition: form-data; name=\"");
                put_escaped(dst, entry.name());
                dst.put_u8(b'"');

                if let Some(filename) = filename {
                    dst.put_slice(b"; filename=\"");
                    put_escaped(dst, filename);
                    dst.put_u8(b'"');
                }
                dst.put_slice(b"\r\n");

                if let FormValue::Binary { content_type: Some(mime), .. } = entry.value() {
                    write!(FastWrite(dst), "Content-Type: {mime}\r\n")?;
                }

                dst.put_slice(b"\r\n");
            }

            MultipartItem::Close => {
                dst.reserve(self.boundary.len() + 6);
                dst.put_slice(b"--");
                dst.put_slice(self.boundary.as_bytes());
                dst.put_slice(b"--\r\n");
            }
        }
        Ok(())
    }
}

/// Writes a header parameter value, percent-escaping the bytes that would end it early.
fn put_escaped(dst: &mut BytesMut, value: &str) {
    for b in value.bytes() {
        match b {
            b'"' => dst.put_slice(b"%22"),
            b'\r' => dst.put_slice(b"%0D"),
            b'\n' => dst.put_slice(b"%0A"),
            b => dst.put_u8(b),
        }
    }
}

/// Writer adapter appending to a `BytesMut` whose capacity is already reserved.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
