use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame};
use mime::Mime;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::{generate_boundary, MultipartEncoder, MultipartItem};
use crate::protocol::body::{FormEntry, FormValue};
use crate::protocol::BodyError;

const CRLF: &[u8] = b"\r\n";

/// Where the stream is within the current entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Head,
    Value,
    Delimiter,
    Close,
    Done,
}

/// A lazily serialized `multipart/form-data` body.
///
/// FormStream owns a shared view of sealed form entries and produces the wire
/// bytes only when polled, one frame at a time:
///
/// 1. the part head (boundary line and headers), encoded by [`MultipartEncoder`]
/// 2. the value bytes, handed out without copying for binary entries
/// 3. the `\r\n` closing the part
///
/// and finally the `--<boundary>--` close delimiter. Each stream draws its own
/// random boundary, so two streams over the same entries differ only in the
/// boundary token.
#[derive(Debug)]
pub struct FormStream {
    entries: Arc<[FormEntry]>,
    encoder: Option<MultipartEncoder>,
    index: usize,
    phase: Phase,
}

impl FormStream {
    /// Creates a stream over `entries` framed by a freshly generated boundary.
    pub(crate) fn new(entries: Arc<[FormEntry]>) -> Self {
        Self::with_boundary(entries, generate_boundary())
    }

    pub(crate) fn with_boundary(entries: Arc<[FormEntry]>, boundary: impl Into<String>) -> Self {
        Self { entries, encoder: Some(MultipartEncoder::new(boundary)), index: 0, phase: Phase::Head }
    }

    /// Creates a stream that yields no data at all, used for requests without a body.
    pub fn empty() -> Self {
        Self { entries: Arc::from(Vec::new()), encoder: None, index: 0, phase: Phase::Done }
    }

    /// Returns the boundary framing this stream, or `None` for an empty stream
    pub fn boundary(&self) -> Option<&str> {
        self.encoder.as_ref().map(MultipartEncoder::boundary)
    }

    /// Returns `multipart/form-data; boundary=<boundary>`, or `None` for an empty stream
    pub fn content_type(&self) -> Option<Mime> {
        self.encoder.as_ref().and_then(|encoder| encoder.content_type().ok())
    }

    fn next_frame(&mut self) -> Result<Option<Frame<Bytes>>, BodyError> {
        let Some(encoder) = &mut self.encoder else {
            return Ok(None);
        };

        loop {
            match self.phase {
                Phase::Head => {
                    let Some(entry) = self.entries.get(self.index) else {
                        self.phase = Phase::Close;
                        continue;
                    };

                    let mut head = BytesMut::new();
                    if let Err(e) = encoder.encode(MultipartItem::Part(entry), &mut head) {
                        self.phase = Phase::Done;
                        return Err(e);
                    }

                    trace!(index = self.index, name = entry.name(), "emit form part");
                    self.phase = Phase::Value;
                    return Ok(Some(Frame::data(head.freeze())));
                }

                Phase::Value => {
                    self.phase = Phase::Delimiter;
                    let value = match self.entries.get(self.index).map(FormEntry::value) {
                        Some(FormValue::Text(text)) => Bytes::copy_from_slice(text.as_bytes()),
                        Some(FormValue::Binary { data, .. }) => data.clone(),
                        None => continue,
                    };

                    if value.is_empty() {
                        continue;
                    }
                    return Ok(Some(Frame::data(value)));
                }

                Phase::Delimiter => {
                    self.index += 1;
                    self.phase = Phase::Head;
                    return Ok(Some(Frame::data(Bytes::from_static(CRLF))));
                }

                Phase::Close => {
                    let mut close = BytesMut::new();
                    self.phase = Phase::Done;
                    encoder.encode(MultipartItem::Close, &mut close)?;

                    trace!(parts = self.entries.len(), "finished form stream");
                    return Ok(Some(Frame::data(close.freeze())));
                }

                Phase::Done => return Ok(None),
            }
        }
    }
}

impl Body for FormStream {
    type Data = Bytes;
    type Error = BodyError;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.get_mut().next_frame().transpose())
    }

    fn is_end_stream(&self) -> bool {
        self.phase == Phase::Done
    }
}
