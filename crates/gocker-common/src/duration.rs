//! Duration parsing for interval flags.
//!
//! Accepts strings like "500ms", "5s", "2m", "1h" and compounds such as
//! "1h30m". Every component needs a unit.

use std::time::Duration;

use crate::error::{AgentError, Result};

/// Parses a duration string like "10s", "2m", "1h30m", or "250ms".
///
/// # Errors
///
/// Returns `AgentError::Config` if the string is empty, has a component
/// without a unit, or uses an unknown unit.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    let invalid = || AgentError::Config {
        message: format!("invalid duration {input:?}"),
    };

    if s.is_empty() {
        return Err(invalid());
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(invalid());
        }
        let value: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
        let component = match &rest[..unit_len] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60).ok_or_else(invalid)?),
            "h" => Duration::from_secs(value.checked_mul(3600).ok_or_else(invalid)?),
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        total = total.checked_add(component).ok_or_else(invalid)?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_units() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn parse_compound_duration() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(
            parse_duration("1m30s250ms").unwrap(),
            Duration::from_millis(90_250)
        );
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(parse_duration("  10s ").unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn parse_zero() {
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_rejects_invalid_input() {
        for input in ["", "abc", "5", "5x", "-5s", "s", "1.5s", "10 s"] {
            assert!(parse_duration(input).is_err(), "{input:?} should fail");
        }
    }
}
