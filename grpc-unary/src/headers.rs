//! gRPC header names, request header construction, and status extraction
//! from response headers or trailers.

use http::header::{CONTENT_TYPE, TE, USER_AGENT as USER_AGENT_HEADER};
use http::{HeaderMap, HeaderName, HeaderValue};
use protocol_grpc::{
    ACCEPT_ENCODING, Code, Compression, Status, decode_binary_header, percent_decode,
};

use crate::error::Error;

pub const GRPC_ENCODING: HeaderName = HeaderName::from_static("grpc-encoding");
pub const GRPC_ACCEPT_ENCODING: HeaderName = HeaderName::from_static("grpc-accept-encoding");
pub const GRPC_TIMEOUT: HeaderName = HeaderName::from_static("grpc-timeout");
pub const GRPC_STATUS: HeaderName = HeaderName::from_static("grpc-status");
pub const GRPC_MESSAGE: HeaderName = HeaderName::from_static("grpc-message");
pub const GRPC_STATUS_DETAILS_BIN: HeaderName = HeaderName::from_static("grpc-status-details-bin");

/// The `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("grpc-rust-unary/", env!("CARGO_PKG_VERSION"));

pub const CONTENT_TYPE_PROTO: &str = "application/grpc+proto";

/// Headers sent on every request for the given request compression.
pub fn request_headers(compression: Compression) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(6);
    headers.insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_PROTO));
    headers.insert(GRPC_ENCODING, HeaderValue::from_static(compression.name()));
    headers.insert(GRPC_ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING));
    headers.insert(TE, HeaderValue::from_static("trailers"));
    headers
}

/// Read a gRPC outcome from `headers`, which may be response headers or
/// trailers.
///
/// Returns `None` when `grpc-status` is absent, empty or `0`. A valid
/// `grpc-status-details-bin` overrides the code and message taken from
/// `grpc-status` and `grpc-message`, and supplies the details.
pub fn extract_error(headers: &HeaderMap) -> Option<Error> {
    let raw = headers.get(&GRPC_STATUS)?;
    let text = match raw.to_str() {
        Ok(text) => text,
        Err(_) => {
            return Some(Error::new(
                Code::UNKNOWN,
                format!("gRPC protocol error: got invalid error code {raw:?}"),
            ));
        }
    };
    if text.is_empty() || text == "0" {
        return None;
    }
    let code = match text.parse::<u32>() {
        Ok(code) => Code::from_u32(code),
        Err(_) => {
            return Some(Error::new(
                Code::UNKNOWN,
                format!("gRPC protocol error: got invalid error code {text:?}"),
            ));
        }
    };

    let message = headers
        .get(&GRPC_MESSAGE)
        .map(|value| percent_decode(&String::from_utf8_lossy(value.as_bytes())))
        .unwrap_or_default();
    let draft = Error::new(code, message);

    let details = match headers.get(&GRPC_STATUS_DETAILS_BIN) {
        Some(value) if !value.is_empty() => value,
        _ => return Some(draft),
    };
    let payload = match details
        .to_str()
        .map_err(|err| err.to_string())
        .and_then(|value| decode_binary_header(value).map_err(|err| err.to_string()))
    {
        Ok(payload) => payload,
        Err(err) => {
            return Some(Error::new(
                Code::UNKNOWN,
                format!("server returned invalid grpc-status-details-bin trailer: {err}"),
            ));
        }
    };
    match Status::decode(&payload) {
        Ok(status) => Some(Error::from_status(status)),
        Err(err) => Some(Error::new(
            Code::UNKNOWN,
            format!("server returned invalid protobuf for error details: {err}"),
        )),
    }
}
