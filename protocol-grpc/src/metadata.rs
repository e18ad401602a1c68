//! Header value encodings used by gRPC metadata.
//!
//! `grpc-message` is percent-encoded so that arbitrary UTF-8 survives HTTP
//! header transport. Headers with a `-bin` suffix carry base64 with optional
//! padding.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::StatusError;

/// Accepts standard base64 with or without `=` padding.
const BINARY_HEADER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Percent-encode a `grpc-message` value. Bytes outside printable ASCII and
/// `%` itself are escaped.
pub fn percent_encode(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for &b in message.as_bytes() {
        if (0x20..=0x7e).contains(&b) && b != b'%' {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(hex_digit(b >> 4));
            out.push(hex_digit(b & 0x0f));
        }
    }
    out
}

/// Decode a percent-encoded `grpc-message` value.
///
/// Malformed escapes are kept literally and invalid UTF-8 is replaced, since
/// the message is informational and must never fail the call.
pub fn percent_decode(value: &str) -> String {
    if !value.contains('%') {
        return value.to_string();
    }

    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (from_hex(bytes[i + 1]), from_hex(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Decode a `-bin` header value.
pub fn decode_binary_header(value: &str) -> Result<Vec<u8>, StatusError> {
    Ok(BINARY_HEADER.decode(value)?)
}

/// Encode bytes for a `-bin` header, without padding.
pub fn encode_binary_header(data: &[u8]) -> String {
    BINARY_HEADER.encode(data)
}

fn hex_digit(n: u8) -> char {
    char::from(b"0123456789ABCDEF"[n as usize])
}

fn from_hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
