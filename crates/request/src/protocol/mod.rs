//! Core request abstractions.
//!
//! This module provides the in-memory building blocks of a request: the
//! envelope, its multipart form body and the error types they report.
//!
//! # Architecture
//!
//! - **Request Envelope** ([`request`]): target, method, headers and one body
//!   - [`RequestEnvelope`]: reads its body once, clones into independent readers
//!   - [`RequestOptions`]: builder for the recognized construction options
//!
//! - **Form Body** ([`body`]): ordered multipart entries and their readers
//!   - [`body::FormBody`]: shared, append-until-read entry sequence
//!   - [`body::BodyCursor`]: single-pass consumption state
//!   - [`body::FormStream`]: lazy `http_body::Body` serialization
//!
//! - **Error Handling** ([`error`]):
//!   - [`RequestError`]: Top-level error type
//!   - [`BodyError`]: body mutation, consumption and encoding errors

mod request;
pub use request::RequestEnvelope;
pub use request::RequestOptions;

mod error;
pub use error::BodyError;
pub use error::RequestError;

pub mod body;
