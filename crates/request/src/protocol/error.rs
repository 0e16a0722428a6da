use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid request target: {reason}")]
    InvalidTarget { reason: String },

    #[error("body error: {source}")]
    Body {
        #[from]
        source: BodyError,
    },
}

impl RequestError {
    pub fn invalid_target<S: ToString>(str: S) -> Self {
        Self::InvalidTarget { reason: str.to_string() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BodyError {
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("body already consumed")]
    AlreadyConsumed,

    #[error("encoding error: {reason}")]
    Encoding { reason: String },
}

impl BodyError {
    pub fn invalid_state<S: ToString>(str: S) -> Self {
        Self::InvalidState { reason: str.to_string() }
    }

    pub fn encoding<S: ToString>(str: S) -> Self {
        Self::Encoding { reason: str.to_string() }
    }

    /// Returns true if this error was raised by a read on an already used cursor
    #[inline]
    pub fn is_already_consumed(&self) -> bool {
        matches!(self, BodyError::AlreadyConsumed)
    }

    /// Returns true if this error was raised by a mutation on a sealed body
    #[inline]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, BodyError::InvalidState { .. })
    }
}

impl From<io::Error> for BodyError {
    fn from(e: io::Error) -> Self {
        Self::encoding(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_error_converts_into_request_error() {
        let error: RequestError = BodyError::AlreadyConsumed.into();
        assert!(matches!(error, RequestError::Body { source: BodyError::AlreadyConsumed }));
        assert_eq!(error.to_string(), "body error: body already consumed");
    }

    #[test]
    fn helpers_build_reasons() {
        let error = BodyError::invalid_state("body already being consumed");
        assert!(error.is_invalid_state());
        assert_eq!(error.to_string(), "invalid state: body already being consumed");

        assert!(BodyError::encoding("bad").to_string().contains("bad"));
        assert!(RequestError::invalid_target("empty").to_string().ends_with("empty"));
    }
}
