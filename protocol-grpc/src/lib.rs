//! Sans-IO gRPC-over-HTTP protocol pieces.
//!
//! This crate holds the parts of the gRPC wire protocol that do not touch a
//! socket: the canonical status codes, the length-prefixed message framing
//! with optional gzip compression, `grpc-timeout` encoding, `grpc-message`
//! percent-encoding, and the `google.rpc.Status` payload carried in
//! `grpc-status-details-bin`. It has no protobuf code generator dependency;
//! message bodies are raw `&[u8]`.
//!
//! # Example
//!
//! ```
//! use protocol_grpc::{Code, Compression, message};
//!
//! // Frame a request body.
//! let mut body = Vec::new();
//! message::marshal(b"\x08\x2a", Compression::Gzip, 0, &mut body).unwrap();
//!
//! // Unframe a response body.
//! let payload = message::unmarshal(&body, Compression::Gzip, 0).unwrap();
//! assert_eq!(payload, b"\x08\x2a");
//!
//! assert_eq!(Code::parse("CANCELLED").unwrap(), Code::CANCELED);
//! assert_eq!(Code::from_http_status(503), Some(Code::UNAVAILABLE));
//! ```

pub mod code;
pub mod compression;
pub mod error;
pub mod message;
pub mod metadata;
pub mod proto;
pub mod status;
pub mod timeout;

pub use code::Code;
pub use compression::{ACCEPT_ENCODING, Compression};
pub use error::{FrameError, InvalidCode, StatusError, TimeoutError};
pub use metadata::{decode_binary_header, encode_binary_header, percent_decode, percent_encode};
pub use status::{Any, Status};
pub use timeout::{decode_timeout, encode_timeout};
