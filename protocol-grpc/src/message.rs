//! gRPC length-prefixed message framing.
//!
//! Format: 1 byte compress flag + 4 byte big-endian length + payload.
//! The flag is 0 for an uncompressed payload and 1 for a payload compressed
//! with the algorithm negotiated through `grpc-encoding`.

use crate::compression::Compression;
use crate::error::FrameError;

/// Size of the flag byte plus the length prefix.
pub const PREFIX_LEN: usize = 5;

const FLAG_UNCOMPRESSED: u8 = 0;
const FLAG_COMPRESSED: u8 = 1;

/// One decoded frame, borrowing its payload from the input buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Whether the compress flag was set.
    pub compressed: bool,
    /// The payload exactly as carried on the wire.
    pub payload: &'a [u8],
}

/// Result of attempting to decode a frame from a buffer.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeResult<'a> {
    /// A complete frame was decoded. Contains the frame and bytes consumed.
    Complete { frame: Frame<'a>, consumed: usize },
    /// Not enough data yet; need at least this many more bytes.
    Incomplete(usize),
}

/// Try to decode one frame from the front of `buf`.
pub fn decode(buf: &[u8]) -> Result<DecodeResult<'_>, FrameError> {
    if buf.len() < PREFIX_LEN {
        return Ok(DecodeResult::Incomplete(PREFIX_LEN - buf.len()));
    }

    let compressed = match buf[0] {
        FLAG_UNCOMPRESSED => false,
        FLAG_COMPRESSED => true,
        other => return Err(FrameError::InvalidFlags(other)),
    };
    let length = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
    let total = PREFIX_LEN + length;

    if buf.len() < total {
        return Ok(DecodeResult::Incomplete(total - buf.len()));
    }

    Ok(DecodeResult::Complete {
        frame: Frame {
            compressed,
            payload: &buf[PREFIX_LEN..total],
        },
        consumed: total,
    })
}

/// Frame `payload` into `out`, compressing it when `compression` is not
/// identity. `max_bytes` bounds the uncompressed payload (`0` = unbounded).
pub fn marshal(
    payload: &[u8],
    compression: Compression,
    max_bytes: usize,
    out: &mut Vec<u8>,
) -> Result<(), FrameError> {
    if max_bytes > 0 && payload.len() > max_bytes {
        return Err(FrameError::TooLarge {
            size: payload.len(),
            max: max_bytes,
        });
    }

    let (flag, body) = match compression {
        Compression::Identity => (FLAG_UNCOMPRESSED, None),
        Compression::Gzip => (FLAG_COMPRESSED, Some(compression.compress(payload)?)),
    };
    let body = body.as_deref().unwrap_or(payload);
    let length = u32::try_from(body.len()).map_err(|_| FrameError::Oversized(body.len()))?;

    out.reserve(PREFIX_LEN + body.len());
    out.push(flag);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(body);
    Ok(())
}

/// Decode the single frame at the front of `buf` and return its
/// decompressed payload. Bytes after the frame are ignored.
///
/// `max_bytes` (`0` = unbounded) bounds both the declared length and the
/// decompressed size.
pub fn unmarshal(
    buf: &[u8],
    compression: Compression,
    max_bytes: usize,
) -> Result<Vec<u8>, FrameError> {
    if buf.len() >= PREFIX_LEN {
        let declared = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
        if max_bytes > 0 && declared > max_bytes {
            return Err(FrameError::TooLarge {
                size: declared,
                max: max_bytes,
            });
        }
    }

    let frame = match decode(buf)? {
        DecodeResult::Complete { frame, .. } => frame,
        DecodeResult::Incomplete(needed) => return Err(FrameError::Truncated { needed }),
    };

    if !frame.compressed {
        return Ok(frame.payload.to_vec());
    }
    if compression == Compression::Identity {
        return Err(FrameError::UnexpectedCompression);
    }
    compression.decompress(frame.payload, max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_frame_layout() {
        let payload = b"\x08\x96\x01";
        let mut buf = Vec::new();
        marshal(payload, Compression::Identity, 0, &mut buf).unwrap();

        assert_eq!(buf.len(), PREFIX_LEN + payload.len());
        assert_eq!(buf[0], 0);
        assert_eq!(
            u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]),
            payload.len() as u32
        );
        assert_eq!(&buf[PREFIX_LEN..], payload);
    }

    #[test]
    fn gzip_frame_sets_flag() {
        let payload = vec![7u8; 512];
        let mut buf = Vec::new();
        marshal(&payload, Compression::Gzip, 0, &mut buf).unwrap();
        assert_eq!(buf[0], 1);
        assert_eq!(unmarshal(&buf, Compression::Gzip, 0).unwrap(), payload);
    }

    #[test]
    fn compressed_flag_under_identity() {
        let mut buf = Vec::new();
        marshal(b"abc", Compression::Gzip, 0, &mut buf).unwrap();
        assert!(matches!(
            unmarshal(&buf, Compression::Identity, 0),
            Err(FrameError::UnexpectedCompression)
        ));
    }

    #[test]
    fn uncompressed_frame_under_gzip_is_accepted() {
        let mut buf = Vec::new();
        marshal(b"plain", Compression::Identity, 0, &mut buf).unwrap();
        assert_eq!(unmarshal(&buf, Compression::Gzip, 0).unwrap(), b"plain");
    }

    #[test]
    fn prefix_not_yet_complete() {
        assert_eq!(decode(&[]).unwrap(), DecodeResult::Incomplete(5));
        assert_eq!(decode(&[0, 0]).unwrap(), DecodeResult::Incomplete(3));
        assert_eq!(decode(&[0, 0, 0, 0]).unwrap(), DecodeResult::Incomplete(1));
    }

    #[test]
    fn payload_not_yet_complete() {
        let mut buf = Vec::new();
        marshal(b"hello", Compression::Identity, 0, &mut buf).unwrap();
        buf.truncate(7);
        assert_eq!(decode(&buf).unwrap(), DecodeResult::Incomplete(3));
        assert!(matches!(
            unmarshal(&buf, Compression::Identity, 0),
            Err(FrameError::Truncated { needed: 3 })
        ));
    }

    #[test]
    fn empty_body_is_truncated() {
        assert!(matches!(
            unmarshal(&[], Compression::Identity, 0),
            Err(FrameError::Truncated { needed: 5 })
        ));
    }

    #[test]
    fn invalid_flags() {
        assert!(matches!(
            decode(&[2, 0, 0, 0, 0]),
            Err(FrameError::InvalidFlags(2))
        ));
    }

    #[test]
    fn size_limits() {
        let mut buf = Vec::new();
        assert!(matches!(
            marshal(b"0123456789", Compression::Identity, 4, &mut buf),
            Err(FrameError::TooLarge { size: 10, max: 4 })
        ));
        assert!(buf.is_empty());

        marshal(b"0123456789", Compression::Identity, 0, &mut buf).unwrap();
        assert!(matches!(
            unmarshal(&buf, Compression::Identity, 4),
            Err(FrameError::TooLarge { size: 10, max: 4 })
        ));
        assert_eq!(unmarshal(&buf, Compression::Identity, 10).unwrap().len(), 10);
    }

    #[test]
    fn decompressed_size_limit() {
        // 4 KiB of zeros compresses well below the limit but inflates past it.
        let payload = vec![0u8; 4096];
        let mut buf = Vec::new();
        marshal(&payload, Compression::Gzip, 0, &mut buf).unwrap();
        assert!(buf.len() < 1024);
        assert!(matches!(
            unmarshal(&buf, Compression::Gzip, 1024),
            Err(FrameError::TooLarge { max: 1024, .. })
        ));
    }

    #[test]
    fn trailing_bytes_ignored() {
        let mut buf = Vec::new();
        marshal(b"first", Compression::Identity, 0, &mut buf).unwrap();
        buf.extend_from_slice(b"garbage");
        assert_eq!(unmarshal(&buf, Compression::Identity, 0).unwrap(), b"first");
    }

    #[test]
    fn decode_walks_back_to_back_frames() {
        let mut buf = Vec::new();
        marshal(b"first", Compression::Identity, 0, &mut buf).unwrap();
        marshal(b"second", Compression::Gzip, 0, &mut buf).unwrap();

        let DecodeResult::Complete { frame, consumed } = decode(&buf).unwrap() else {
            panic!("first frame incomplete");
        };
        assert!(!frame.compressed);
        assert_eq!(frame.payload, b"first");
        assert_eq!(consumed, PREFIX_LEN + 5);

        let DecodeResult::Complete { frame, consumed: rest } = decode(&buf[consumed..]).unwrap()
        else {
            panic!("second frame incomplete");
        };
        assert!(frame.compressed);
        assert_eq!(Compression::Gzip.decompress(frame.payload, 0).unwrap(), b"second");
        assert_eq!(consumed + rest, buf.len());
    }
}
