//! `grpc-timeout` header encoding.
//!
//! The value is at most 8 ASCII digits followed by a unit: `H` hours,
//! `M` minutes, `S` seconds, `m` milliseconds, `u` microseconds,
//! `n` nanoseconds.

use std::time::Duration;

use crate::error::TimeoutError;

const MAX_VALUE: u128 = 99_999_999;
const MAX_DIGITS: usize = 8;

const UNITS: [(u128, char); 6] = [
    (1, 'n'),
    (1_000, 'u'),
    (1_000_000, 'm'),
    (1_000_000_000, 'S'),
    (60 * 1_000_000_000, 'M'),
    (3_600 * 1_000_000_000, 'H'),
];

/// Encode `timeout` using the finest unit that fits in 8 digits.
///
/// Finer units are truncated, never rounded up, so the encoded value never
/// exceeds the real remaining time.
pub fn encode_timeout(timeout: Duration) -> Result<String, TimeoutError> {
    let nanos = timeout.as_nanos();
    for (scale, unit) in UNITS {
        let value = nanos / scale;
        if value <= MAX_VALUE {
            return Ok(format!("{value}{unit}"));
        }
    }
    Err(TimeoutError::TooLong)
}

/// Parse a `grpc-timeout` header value.
pub fn decode_timeout(value: &str) -> Result<Duration, TimeoutError> {
    let invalid = || TimeoutError::Invalid(value.to_string());

    let mut chars = value.chars();
    let unit = chars.next_back().ok_or_else(invalid)?;
    let digits = chars.as_str();
    if digits.is_empty()
        || digits.len() > MAX_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    let amount: u64 = digits.parse().map_err(|_| invalid())?;

    let duration = match unit {
        'n' => Duration::from_nanos(amount),
        'u' => Duration::from_micros(amount),
        'm' => Duration::from_millis(amount),
        'S' => Duration::from_secs(amount),
        'M' => Duration::from_secs(amount * 60),
        'H' => Duration::from_secs(amount * 3_600),
        _ => return Err(invalid()),
    };
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_picks_finest_unit() {
        assert_eq!(encode_timeout(Duration::ZERO).unwrap(), "0n");
        assert_eq!(encode_timeout(Duration::from_nanos(1)).unwrap(), "1n");
        assert_eq!(encode_timeout(Duration::from_nanos(99_999_999)).unwrap(), "99999999n");
        assert_eq!(encode_timeout(Duration::from_nanos(100_000_000)).unwrap(), "100000u");
        assert_eq!(encode_timeout(Duration::from_secs(1)).unwrap(), "1000000u");
        assert_eq!(encode_timeout(Duration::from_secs(100)).unwrap(), "100000m");
        assert_eq!(encode_timeout(Duration::from_secs(100_000)).unwrap(), "100000S");
        assert_eq!(encode_timeout(Duration::from_secs(100_000_000)).unwrap(), "1666666M");
    }

    #[test]
    fn encode_truncates() {
        // 123.4567891 seconds does not fit in nanoseconds or microseconds.
        let timeout = Duration::new(123, 456_789_100);
        assert_eq!(encode_timeout(timeout).unwrap(), "123456m");
    }

    #[test]
    fn encode_too_long() {
        assert_eq!(encode_timeout(Duration::MAX), Err(TimeoutError::TooLong));
        let limit = Duration::from_secs(99_999_999 * 3_600);
        assert_eq!(encode_timeout(limit).unwrap(), "99999999H");
    }

    #[test]
    fn decode_values() {
        assert_eq!(decode_timeout("1H").unwrap(), Duration::from_secs(3_600));
        assert_eq!(decode_timeout("2M").unwrap(), Duration::from_secs(120));
        assert_eq!(decode_timeout("3S").unwrap(), Duration::from_secs(3));
        assert_eq!(decode_timeout("4m").unwrap(), Duration::from_millis(4));
        assert_eq!(decode_timeout("5u").unwrap(), Duration::from_micros(5));
        assert_eq!(decode_timeout("6n").unwrap(), Duration::from_nanos(6));
    }

    #[test]
    fn decode_rejects_malformed() {
        for value in ["", "S", "123", "1s", "123456789S", "-1S", "1.5S", "+1S"] {
            assert!(decode_timeout(value).is_err(), "{value:?} should be rejected");
        }
    }

    #[test]
    fn encoded_values_decode() {
        for timeout in [
            Duration::from_millis(250),
            Duration::from_secs(30),
            Duration::from_secs(86_400),
        ] {
            let encoded = encode_timeout(timeout).unwrap();
            assert_eq!(decode_timeout(&encoded).unwrap(), timeout);
        }
    }
}
