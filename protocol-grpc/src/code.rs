//! gRPC canonical status codes (<https://grpc.github.io/grpc/core/md_doc_statuscodes.html>).
//!
//! There are no user-defined codes. A [`Code`] can still carry an
//! out-of-table value received off the wire so that it can be displayed,
//! but such values are rejected by [`Code::to_text`] and [`Code::parse`].

use std::fmt;
use std::str::FromStr;

use crate::error::InvalidCode;

/// A gRPC status code.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code(u32);

impl Code {
    /// Success.
    pub const OK: Code = Code(0);
    /// Canceled, usually by the caller.
    pub const CANCELED: Code = Code(1);
    /// Unknown error.
    pub const UNKNOWN: Code = Code(2);
    /// Argument invalid regardless of system state.
    pub const INVALID_ARGUMENT: Code = Code(3);
    /// Operation expired, may or may not have completed.
    pub const DEADLINE_EXCEEDED: Code = Code(4);
    /// Entity not found.
    pub const NOT_FOUND: Code = Code(5);
    /// Entity already exists.
    pub const ALREADY_EXISTS: Code = Code(6);
    /// Operation not authorized.
    pub const PERMISSION_DENIED: Code = Code(7);
    /// Quota exhausted.
    pub const RESOURCE_EXHAUSTED: Code = Code(8);
    /// Argument invalid in the current system state.
    pub const FAILED_PRECONDITION: Code = Code(9);
    /// Operation aborted.
    pub const ABORTED: Code = Code(10);
    /// Out of bounds.
    pub const OUT_OF_RANGE: Code = Code(11);
    /// Operation not implemented or disabled.
    pub const UNIMPLEMENTED: Code = Code(12);
    /// Internal error, reserved for serious errors.
    pub const INTERNAL: Code = Code(13);
    /// Unavailable, the client should back off and retry.
    pub const UNAVAILABLE: Code = Code(14);
    /// Unrecoverable data loss or corruption.
    pub const DATA_LOSS: Code = Code(15);
    /// Request is not authenticated.
    pub const UNAUTHENTICATED: Code = Code(16);

    const MAX: u32 = 16;

    /// Every canonical code, in numeric order.
    pub const ALL: [Code; 17] = [
        Code::OK,
        Code::CANCELED,
        Code::UNKNOWN,
        Code::INVALID_ARGUMENT,
        Code::DEADLINE_EXCEEDED,
        Code::NOT_FOUND,
        Code::ALREADY_EXISTS,
        Code::PERMISSION_DENIED,
        Code::RESOURCE_EXHAUSTED,
        Code::FAILED_PRECONDITION,
        Code::ABORTED,
        Code::OUT_OF_RANGE,
        Code::UNIMPLEMENTED,
        Code::INTERNAL,
        Code::UNAVAILABLE,
        Code::DATA_LOSS,
        Code::UNAUTHENTICATED,
    ];

    /// Wrap a raw value without validating it.
    pub const fn from_u32(v: u32) -> Self {
        Code(v)
    }

    /// The raw numeric value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Whether this is one of the 17 canonical codes.
    pub const fn is_valid(self) -> bool {
        self.0 <= Self::MAX
    }

    /// The canonical upper-case name, e.g.
    /// `FAILED_PRECONDITION`. Note the British spelling of `CANCELLED`.
    pub fn canonical_name(self) -> Option<&'static str> {
        let name = match self {
            Code::OK => "OK",
            Code::CANCELED => "CANCELLED",
            Code::UNKNOWN => "UNKNOWN",
            Code::INVALID_ARGUMENT => "INVALID_ARGUMENT",
            Code::DEADLINE_EXCEEDED => "DEADLINE_EXCEEDED",
            Code::NOT_FOUND => "NOT_FOUND",
            Code::ALREADY_EXISTS => "ALREADY_EXISTS",
            Code::PERMISSION_DENIED => "PERMISSION_DENIED",
            Code::RESOURCE_EXHAUSTED => "RESOURCE_EXHAUSTED",
            Code::FAILED_PRECONDITION => "FAILED_PRECONDITION",
            Code::ABORTED => "ABORTED",
            Code::OUT_OF_RANGE => "OUT_OF_RANGE",
            Code::UNIMPLEMENTED => "UNIMPLEMENTED",
            Code::INTERNAL => "INTERNAL",
            Code::UNAVAILABLE => "UNAVAILABLE",
            Code::DATA_LOSS => "DATA_LOSS",
            Code::UNAUTHENTICATED => "UNAUTHENTICATED",
            _ => return None,
        };
        Some(name)
    }

    fn display_name(self) -> Option<&'static str> {
        let name = match self {
            Code::OK => "OK",
            Code::CANCELED => "Canceled",
            Code::UNKNOWN => "Unknown",
            Code::INVALID_ARGUMENT => "InvalidArgument",
            Code::DEADLINE_EXCEEDED => "DeadlineExceeded",
            Code::NOT_FOUND => "NotFound",
            Code::ALREADY_EXISTS => "AlreadyExists",
            Code::PERMISSION_DENIED => "PermissionDenied",
            Code::RESOURCE_EXHAUSTED => "ResourceExhausted",
            Code::FAILED_PRECONDITION => "FailedPrecondition",
            Code::ABORTED => "Aborted",
            Code::OUT_OF_RANGE => "OutOfRange",
            Code::UNIMPLEMENTED => "Unimplemented",
            Code::INTERNAL => "Internal",
            Code::UNAVAILABLE => "Unavailable",
            Code::DATA_LOSS => "DataLoss",
            Code::UNAUTHENTICATED => "Unauthenticated",
            _ => return None,
        };
        Some(name)
    }

    /// Serialize as the decimal numeral carried in `grpc-status`.
    pub fn to_text(self) -> Result<String, InvalidCode> {
        if !self.is_valid() {
            return Err(InvalidCode::OutOfRange(u64::from(self.0)));
        }
        Ok(self.0.to_string())
    }

    /// Parse either a canonical name (`NOT_FOUND`, `CANCELLED`, ...) or a decimal
    /// numeral in `0..=16`.
    pub fn parse(text: &str) -> Result<Self, InvalidCode> {
        if let Some(code) = Code::ALL.iter().find(|c| c.canonical_name() == Some(text)) {
            return Ok(*code);
        }
        let n: u64 = text
            .parse()
            .map_err(|_| InvalidCode::Unrecognized(text.to_string()))?;
        if n > u64::from(Self::MAX) {
            return Err(InvalidCode::OutOfRange(n));
        }
        Ok(Code(n as u32))
    }

    /// Map a non-gRPC HTTP failure to a code, following
    /// <https://github.com/grpc/grpc/blob/master/doc/http-grpc-status-mapping.md>.
    ///
    /// Returns `None` for 200. This is not the inverse of any gRPC-to-HTTP
    /// mapping.
    pub fn from_http_status(status: u16) -> Option<Self> {
        let code = match status {
            200 => return None,
            400 => Code::INTERNAL,
            401 => Code::UNAUTHENTICATED,
            403 => Code::PERMISSION_DENIED,
            404 => Code::UNIMPLEMENTED,
            429 | 502 | 503 | 504 => Code::UNAVAILABLE,
            _ => Code::UNKNOWN,
        };
        Some(code)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Code({})", self.0),
        }
    }
}

impl FromStr for Code {
    type Err = InvalidCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Code::parse(s)
    }
}

impl From<Code> for u32 {
    fn from(code: Code) -> u32 {
        code.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Code {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.to_text().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Code {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        Code::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip() {
        for code in Code::ALL {
            let text = code.to_text().unwrap();
            assert_eq!(Code::parse(&text).unwrap(), code);
        }
    }

    #[test]
    fn canonical_names_parse() {
        for code in Code::ALL {
            assert_eq!(Code::parse(code.canonical_name().unwrap()).unwrap(), code);
        }
        assert_eq!(Code::parse("CANCELLED").unwrap(), Code::CANCELED);
        assert!(Code::parse("CANCELED").is_err());
        assert!(Code::parse("not_found").is_err());
    }

    #[test]
    fn out_of_range_rejected() {
        for n in [17u32, 99, u32::MAX] {
            assert!(Code::from_u32(n).to_text().is_err());
            assert!(Code::parse(&n.to_string()).is_err());
        }
        assert!(Code::parse("-1").is_err());
        assert!(Code::parse("").is_err());
        assert!(Code::parse("SOMETHING_ELSE").is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(Code::OK.to_string(), "OK");
        assert_eq!(Code::CANCELED.to_string(), "Canceled");
        assert_eq!(Code::FAILED_PRECONDITION.to_string(), "FailedPrecondition");
        assert_eq!(Code::UNAUTHENTICATED.to_string(), "Unauthenticated");
        assert_eq!(Code::from_u32(17).to_string(), "Code(17)");
        assert_eq!(Code::from_u32(404).to_string(), "Code(404)");
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(Code::from_http_status(200), None);
        assert_eq!(Code::from_http_status(400), Some(Code::INTERNAL));
        assert_eq!(Code::from_http_status(401), Some(Code::UNAUTHENTICATED));
        assert_eq!(Code::from_http_status(403), Some(Code::PERMISSION_DENIED));
        assert_eq!(Code::from_http_status(404), Some(Code::UNIMPLEMENTED));
        for status in [429, 502, 503, 504] {
            assert_eq!(Code::from_http_status(status), Some(Code::UNAVAILABLE));
        }
        assert_eq!(Code::from_http_status(418), Some(Code::UNKNOWN));
        assert_eq!(Code::from_http_status(500), Some(Code::UNKNOWN));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_text_form() {
        let json = serde_json::to_string(&Code::NOT_FOUND).unwrap();
        assert_eq!(json, "\"5\"");
        let code: Code = serde_json::from_str("\"PERMISSION_DENIED\"").unwrap();
        assert_eq!(code, Code::PERMISSION_DENIED);
        assert!(serde_json::to_string(&Code::from_u32(20)).is_err());
    }
}
