//! Form body handling implementation.
//!
//! This module provides the in-memory body of a request: an ordered multipart
//! form, the cursors that read it and the lazy stream that serializes it.
//!
//! # Architecture
//!
//! - [`FormBody`]: a shared handle to the ordered entry sequence. Mutable until
//!   the first read starts, then sealed and shared read-only.
//! - [`BodyCursor`]: per-reader consumption state (`Unread`, `Reading`,
//!   `Consumed`) over a `FormBody`.
//! - [`FormStream`]: the `http_body::Body` a cursor hands out, producing wire
//!   bytes only when polled.
//!
//! # Design Goals
//!
//! 1. **Single-pass reads**
//!    - Each cursor may be read to completion at most once
//!    - The state machine is explicit and observable through [`CursorState`]
//!
//! 2. **Cheap re-reads**
//!    - A new cursor over the same body starts unread
//!    - Entries are shared through an `Arc`, never copied or pre-serialized
//!
//! 3. **Lazy serialization**
//!    - Nothing is encoded until a stream is polled
//!    - Binary values go out as the same `Bytes` they were appended as

mod cursor;
mod form;
mod form_stream;

pub use cursor::BodyCursor;
pub use cursor::CursorState;
pub use form::FormBody;
pub use form::FormEntry;
pub use form::FormValue;
pub use form_stream::FormStream;
