use bytes::Bytes;
use http_body_util::BodyExt;
use tracing::warn;

use crate::ensure;
use crate::protocol::body::{FormBody, FormStream};
use crate::protocol::BodyError;

/// Consumption state of a [`BodyCursor`].
///
/// `Unread -> Reading -> Consumed`. A cursor only moves forward; `Consumed` is
/// terminal and a cursor left in `Reading` by an abandoned read stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Unread,
    Reading,
    Consumed,
}

/// A single-pass read position over a shared [`FormBody`].
///
/// Cursors are cheap: a handle to the body plus a state flag. Forking a cursor
/// shares the body and starts over at `Unread`, it never copies serialized bytes.
#[derive(Debug)]
pub struct BodyCursor {
    body: FormBody,
    state: CursorState,
}

impl BodyCursor {
    pub fn new(body: FormBody) -> Self {
        Self { body, state: CursorState::Unread }
    }

    #[inline]
    pub fn body(&self) -> &FormBody {
        &self.body
    }

    #[inline]
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Returns true once a read has started on this cursor
    #[inline]
    pub fn is_used(&self) -> bool {
        self.state != CursorState::Unread
    }

    /// Returns a fresh, unread cursor over the same body.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self::new(self.body.clone())
    }

    /// Starts reading: seals the body and hands out a stream with its own boundary.
    ///
    /// The cursor stays in `Reading` until [`finish`](Self::finish) is called, so a
    /// stream that is dropped half way leaves the cursor unusable.
    pub fn begin(&mut self) -> Result<FormStream, BodyError> {
        ensure!(self.state == CursorState::Unread, self.rejected());

        self.state = CursorState::Reading;
        Ok(FormStream::new(self.body.seal()))
    }

    /// Marks a started read as complete.
    pub fn finish(&mut self) {
        if self.state == CursorState::Reading {
            self.state = CursorState::Consumed;
        }
    }

    /// Materializes the whole body and marks the cursor consumed.
    pub async fn read_to_bytes(&mut self) -> Result<Bytes, BodyError> {
        let stream = self.begin()?;
        let collected = stream.collect().await?;
        self.finish();
        Ok(collected.to_bytes())
    }

    fn rejected(&self) -> BodyError {
        warn!(state = ?self.state, "reject read on used body cursor");
        BodyError::AlreadyConsumed
    }
}
