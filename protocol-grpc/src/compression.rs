//! `grpc-encoding` negotiation and gzip payload compression.

use std::fmt;
use std::io::{Read, Write};

use flate2::Compression as GzLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::FrameError;

/// Value advertised in `grpc-accept-encoding` on every request.
pub const ACCEPT_ENCODING: &str = "identity,gzip";

/// A message compression algorithm.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    #[default]
    Identity,
    Gzip,
}

impl Compression {
    /// Every supported algorithm, in advertisement order.
    pub const ALL: [Compression; 2] = [Compression::Identity, Compression::Gzip];

    /// The `grpc-encoding` token.
    pub fn name(self) -> &'static str {
        match self {
            Compression::Identity => "identity",
            Compression::Gzip => "gzip",
        }
    }

    /// Look up a `grpc-encoding` token. Only exact lower-case names match.
    pub fn from_name(name: &str) -> Option<Self> {
        Compression::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Compress `payload`. Identity returns it unchanged.
    pub fn compress(self, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
        match self {
            Compression::Identity => Ok(payload.to_vec()),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len()), GzLevel::default());
                encoder.write_all(payload)?;
                Ok(encoder.finish()?)
            }
        }
    }

    /// Decompress `payload`, failing once the output exceeds `max_bytes`
    /// (`0` means unbounded).
    pub fn decompress(self, payload: &[u8], max_bytes: usize) -> Result<Vec<u8>, FrameError> {
        let out = match self {
            Compression::Identity => payload.to_vec(),
            Compression::Gzip => {
                let mut out = Vec::new();
                let mut decoder = GzDecoder::new(payload);
                if max_bytes == 0 {
                    decoder.read_to_end(&mut out)?;
                } else {
                    // Read one byte past the limit to detect overflow without
                    // inflating the whole payload.
                    decoder.take(max_bytes as u64 + 1).read_to_end(&mut out)?;
                }
                out
            }
        };
        if max_bytes > 0 && out.len() > max_bytes {
            return Err(FrameError::TooLarge {
                size: out.len(),
                max: max_bytes,
            });
        }
        Ok(out)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(Compression::Identity.name(), "identity");
        assert_eq!(Compression::Gzip.to_string(), "gzip");
        assert_eq!(Compression::from_name("gzip"), Some(Compression::Gzip));
        assert_eq!(Compression::from_name("identity"), Some(Compression::Identity));
        assert_eq!(Compression::from_name("brotli"), None);
        assert_eq!(Compression::from_name("GZIP"), None);
        assert_eq!(Compression::default(), Compression::Identity);
    }

    #[test]
    fn gzip_shrinks_repetitive_payload() {
        let payload = vec![b'a'; 4096];
        let compressed = Compression::Gzip.compress(&payload).unwrap();
        assert!(compressed.len() < payload.len());
        assert_eq!(Compression::Gzip.decompress(&compressed, 0).unwrap(), payload);
    }

    #[test]
    fn decompress_enforces_limit() {
        let payload = vec![0u8; 1024];
        let compressed = Compression::Gzip.compress(&payload).unwrap();
        match Compression::Gzip.decompress(&compressed, 100) {
            Err(FrameError::TooLarge { max: 100, .. }) => {}
            other => panic!("expected TooLarge, got {other:?}"),
        }
        assert_eq!(Compression::Gzip.decompress(&compressed, 1024).unwrap().len(), 1024);
    }

    #[test]
    fn decompress_rejects_garbage() {
        assert!(matches!(
            Compression::Gzip.decompress(b"definitely not gzip", 0),
            Err(FrameError::Gzip(_))
        ));
    }
}
