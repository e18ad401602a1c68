//! Minimal protobuf wire format helpers.
//!
//! Just enough of the encoding to read and write `google.rpc.Status` without
//! pulling in a code generator.

/// Wire type for varint (int32, int64, uint32, uint64, bool, enum).
pub const WIRE_TYPE_VARINT: u8 = 0;
/// Wire type for 64-bit fixed values.
pub const WIRE_TYPE_I64: u8 = 1;
/// Wire type for length-delimited (string, bytes, embedded messages).
pub const WIRE_TYPE_LEN: u8 = 2;
/// Wire type for 32-bit fixed values.
pub const WIRE_TYPE_I32: u8 = 5;

/// Longest legal varint: 64 bits in 7-bit groups.
const MAX_VARINT_LEN: usize = 10;

/// Append `value` as a base-128 varint, least significant group first.
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push(value as u8 | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Read a varint from the front of `buf`, advancing it. `None` when the
/// input ends mid-varint or runs past ten bytes.
pub fn decode_varint(buf: &mut &[u8]) -> Option<u64> {
    let bytes = *buf;
    let mut value = 0u64;
    for (i, &byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte < 0x80 {
            *buf = &bytes[i + 1..];
            return Some(value);
        }
    }
    None
}

pub fn encode_tag(field: u32, wire_type: u8, buf: &mut Vec<u8>) {
    encode_varint(u64::from(field) << 3 | u64::from(wire_type), buf);
}

/// Read a field key, returning `(field, wire_type)`.
pub fn decode_tag(buf: &mut &[u8]) -> Option<(u32, u8)> {
    let key = decode_varint(buf)?;
    let field = u32::try_from(key >> 3).ok()?;
    Some((field, (key & 0x7) as u8))
}

/// Length-delimited field carrying raw bytes.
pub fn encode_bytes(field: u32, data: &[u8], buf: &mut Vec<u8>) {
    encode_tag(field, WIRE_TYPE_LEN, buf);
    encode_varint(data.len() as u64, buf);
    buf.extend_from_slice(data);
}

pub fn encode_string(field: u32, value: &str, buf: &mut Vec<u8>) {
    encode_bytes(field, value.as_bytes(), buf);
}

/// Varint field holding an `int32`. Negative values are sign-extended to
/// 64 bits, so they always take ten bytes.
pub fn encode_int32(field: u32, value: i32, buf: &mut Vec<u8>) {
    encode_tag(field, WIRE_TYPE_VARINT, buf);
    encode_varint(i64::from(value) as u64, buf);
}

/// Split a length-prefixed payload off the front of `buf`.
pub fn decode_length_delimited<'a>(buf: &mut &'a [u8]) -> Option<&'a [u8]> {
    let len = usize::try_from(decode_varint(buf)?).ok()?;
    let bytes = *buf;
    let data = bytes.get(..len)?;
    *buf = &bytes[len..];
    Some(data)
}

/// Skip a field based on its wire type. Returns `None` on truncated input or
/// an unsupported (group) wire type.
pub fn skip_field(wire_type: u8, buf: &mut &[u8]) -> Option<()> {
    let width = match wire_type {
        WIRE_TYPE_VARINT => return decode_varint(buf).map(drop),
        WIRE_TYPE_LEN => return decode_length_delimited(buf).map(drop),
        WIRE_TYPE_I64 => 8,
        WIRE_TYPE_I32 => 4,
        _ => return None,
    };
    let bytes = *buf;
    *buf = bytes.get(width..)?;
    Some(())
}
