//! `google.rpc.Status` as carried in `grpc-status-details-bin`.
//!
//! ```text
//! message Status {
//!   int32 code = 1;
//!   string message = 2;
//!   repeated google.protobuf.Any details = 3;
//! }
//!
//! message Any {
//!   string type_url = 1;
//!   bytes value = 2;
//! }
//! ```

use bytes::Bytes;

use crate::error::StatusError;
use crate::metadata::{decode_binary_header, encode_binary_header};
use crate::proto::{
    WIRE_TYPE_I32, WIRE_TYPE_I64, WIRE_TYPE_LEN, WIRE_TYPE_VARINT, decode_length_delimited,
    decode_tag, decode_varint, encode_bytes, encode_int32, encode_string, skip_field,
};

/// An opaque, typed detail payload (`google.protobuf.Any`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Any {
    pub type_url: String,
    pub value: Bytes,
}

impl Any {
    pub fn new(type_url: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            type_url: type_url.into(),
            value: value.into(),
        }
    }

    /// The message name after the last `/` of the type URL.
    pub fn type_name(&self) -> &str {
        self.type_url
            .rsplit_once('/')
            .map_or(self.type_url.as_str(), |(_, name)| name)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.type_url.len() + self.value.len() + 4);
        if !self.type_url.is_empty() {
            encode_string(1, &self.type_url, &mut buf);
        }
        if !self.value.is_empty() {
            encode_bytes(2, &self.value, &mut buf);
        }
        buf
    }

    pub fn decode(mut data: &[u8]) -> Result<Self, StatusError> {
        let mut any = Any::default();
        while !data.is_empty() {
            let (field, wire_type) = decode_tag(&mut data).ok_or(StatusError::Truncated)?;
            match (field, wire_type) {
                (1, WIRE_TYPE_LEN) => any.type_url = decode_string(1, &mut data)?,
                (2, WIRE_TYPE_LEN) => {
                    let value =
                        decode_length_delimited(&mut data).ok_or(StatusError::Truncated)?;
                    any.value = Bytes::copy_from_slice(value);
                }
                _ => skip(wire_type, &mut data)?,
            }
        }
        Ok(any)
    }
}

/// A structured RPC outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub code: i32,
    pub message: String,
    pub details: Vec<Any>,
}

impl Status {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if self.code != 0 {
            encode_int32(1, self.code, &mut buf);
        }
        if !self.message.is_empty() {
            encode_string(2, &self.message, &mut buf);
        }
        for detail in &self.details {
            encode_bytes(3, &detail.encode(), &mut buf);
        }
        buf
    }

    pub fn decode(mut data: &[u8]) -> Result<Self, StatusError> {
        let mut status = Status::default();
        while !data.is_empty() {
            let (field, wire_type) = decode_tag(&mut data).ok_or(StatusError::Truncated)?;
            match (field, wire_type) {
                (1, WIRE_TYPE_VARINT) => {
                    let raw = decode_varint(&mut data).ok_or(StatusError::Truncated)?;
                    // int32 is sign-extended on the wire; truncation recovers it.
                    status.code = raw as i32;
                }
                (2, WIRE_TYPE_LEN) => status.message = decode_string(2, &mut data)?,
                (3, WIRE_TYPE_LEN) => {
                    let embedded =
                        decode_length_delimited(&mut data).ok_or(StatusError::Truncated)?;
                    status.details.push(Any::decode(embedded)?);
                }
                _ => skip(wire_type, &mut data)?,
            }
        }
        Ok(status)
    }

    /// Decode the base64 value of a `grpc-status-details-bin` header.
    pub fn from_header_value(value: &str) -> Result<Self, StatusError> {
        Status::decode(&decode_binary_header(value)?)
    }

    /// Encode as a `grpc-status-details-bin` header value.
    pub fn to_header_value(&self) -> String {
        encode_binary_header(&self.encode())
    }
}

fn decode_string(field: u32, data: &mut &[u8]) -> Result<String, StatusError> {
    let raw = decode_length_delimited(data).ok_or(StatusError::Truncated)?;
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| StatusError::Utf8(field))
}

fn skip(wire_type: u8, data: &mut &[u8]) -> Result<(), StatusError> {
    match wire_type {
        WIRE_TYPE_VARINT | WIRE_TYPE_I64 | WIRE_TYPE_LEN | WIRE_TYPE_I32 => {
            skip_field(wire_type, data).ok_or(StatusError::Truncated)
        }
        other => Err(StatusError::WireType(other)),
    }
}
