//! Error types for the sans-IO protocol layer.

/// A status code that is not one of the 17 canonical codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCode {
    /// Numeric value outside `0..=16`.
    #[error("invalid code {0}")]
    OutOfRange(u64),

    /// Neither a canonical name nor a decimal numeral.
    #[error("invalid code {0:?}")]
    Unrecognized(String),
}

/// Errors from the length-prefixed message codec.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than the 5-byte prefix plus declared length.
    #[error("truncated message: need {needed} more bytes")]
    Truncated { needed: usize },

    /// Declared or decompressed size exceeds the configured limit.
    #[error("message size {size} exceeds limit of {max} bytes")]
    TooLarge { size: usize, max: usize },

    /// The compressed flag was set while the negotiated encoding is identity.
    #[error("compressed flag set but grpc-encoding is identity")]
    UnexpectedCompression,

    /// The flag byte is neither 0 nor 1.
    #[error("invalid message flags {0:#04x}")]
    InvalidFlags(u8),

    /// Payload does not fit in a 32-bit length prefix.
    #[error("message of {0} bytes does not fit in a length prefix")]
    Oversized(usize),

    /// Gzip compression or decompression failed.
    #[error("gzip: {0}")]
    Gzip(#[from] std::io::Error),
}

/// Errors from `grpc-timeout` encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    /// The duration needs more than 8 digits even in hours.
    #[error("timeout too long")]
    TooLong,

    /// The header value is not `<1-8 digits><unit>`.
    #[error("invalid timeout {0:?}")]
    Invalid(String),
}

/// Errors decoding a `google.rpc.Status` or `-bin` header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    /// The binary header is not valid base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Input ended inside a field.
    #[error("truncated protobuf")]
    Truncated,

    /// A field had a wire type this decoder cannot skip.
    #[error("unsupported wire type {0}")]
    WireType(u8),

    /// A string field held invalid UTF-8.
    #[error("invalid utf-8 in field {0}")]
    Utf8(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(InvalidCode::OutOfRange(17).to_string(), "invalid code 17");
        assert_eq!(
            InvalidCode::Unrecognized("nope".into()).to_string(),
            "invalid code \"nope\""
        );
        assert_eq!(
            FrameError::TooLarge { size: 10, max: 4 }.to_string(),
            "message size 10 exceeds limit of 4 bytes"
        );
        assert_eq!(FrameError::InvalidFlags(2).to_string(), "invalid message flags 0x02");
    }
}
