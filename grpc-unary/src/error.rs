//! The error type returned by every unary call.

use std::fmt;
use std::sync::Arc;

use protocol_grpc::{Any, Code, Status};

use crate::transport::BoxError;

/// A failed RPC: a [`Code`], a message that is safe to log or display, and
/// any structured detail payloads the server attached.
#[derive(Debug, Clone)]
pub struct Error {
    code: Code,
    message: String,
    details: Vec<Any>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Build an error from a code and message.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
            source: None,
        }
    }

    /// Wrap an existing error whose message is safe to expose, keeping it as
    /// the source.
    pub fn wrap(code: Code, err: impl Into<BoxError>) -> Self {
        let err: BoxError = err.into();
        Self {
            code,
            message: err.to_string(),
            details: Vec::new(),
            source: Some(Arc::from(err)),
        }
    }

    /// Build an error from a structured status. A negative code cannot be a
    /// canonical code and becomes [`Code::UNKNOWN`].
    pub fn from_status(status: Status) -> Self {
        let code = u32::try_from(status.code).map_or(Code::UNKNOWN, Code::from_u32);
        Self::new(code, status.message).with_details(status.details)
    }

    /// Attach detail payloads.
    pub fn with_details(mut self, details: Vec<Any>) -> Self {
        self.details = details;
        self
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &[Any] {
        &self.details
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::io;

    use bytes::Bytes;

    use super::*;

    #[test]
    fn display() {
        let err = Error::new(Code::NOT_FOUND, "no such widget");
        assert_eq!(err.to_string(), "NotFound: no such widget");
        assert_eq!(Error::new(Code::ABORTED, "").to_string(), "Aborted");
        assert_eq!(Error::new(Code::from_u32(42), "odd").to_string(), "Code(42): odd");
    }

    #[test]
    fn wrap_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err = Error::wrap(Code::UNKNOWN, io_err);
        assert_eq!(err.code(), Code::UNKNOWN);
        assert_eq!(err.message(), "connection refused");
        assert!(err.source().is_some());
        assert!(Error::new(Code::INTERNAL, "x").source().is_none());
    }

    #[test]
    fn from_status() {
        let detail = Any::new(
            "type.googleapis.com/google.rpc.ErrorInfo",
            Bytes::from_static(b"\x0a\x01x"),
        );
        let err = Error::from_status(Status {
            code: 9,
            message: "precondition".into(),
            details: vec![detail.clone()],
        });
        assert_eq!(err.code(), Code::FAILED_PRECONDITION);
        assert_eq!(err.message(), "precondition");
        assert_eq!(err.details(), &[detail]);

        let negative = Error::from_status(Status {
            code: -1,
            ..Status::default()
        });
        assert_eq!(negative.code(), Code::UNKNOWN);
    }
}
