//! Token parsers shared by the slot setters.

use std::time::Duration;

use crate::error::SetError;

/// Unit assumed for a bare number in a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Millis,
}

const MS_PER_SEC: u64 = 1000;

// Descending order; a compound value must list units in this order.
const UNITS: &[(&str, u64)] = &[
    ("y", 365 * 24 * 60 * 60 * MS_PER_SEC),
    ("M", 30 * 24 * 60 * 60 * MS_PER_SEC),
    ("w", 7 * 24 * 60 * 60 * MS_PER_SEC),
    ("d", 24 * 60 * 60 * MS_PER_SEC),
    ("h", 60 * 60 * MS_PER_SEC),
    ("m", 60 * MS_PER_SEC),
    ("s", MS_PER_SEC),
    ("ms", 1),
];

/// Exactly `on` or `off`, lowercase.
pub fn parse_flag(token: &str) -> Result<bool, SetError> {
    match token {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(SetError::invalid(token, "it must be \"on\" or \"off\"")),
    }
}

pub fn parse_int(token: &str) -> Result<i64, SetError> {
    token
        .parse::<i64>()
        .map_err(|_| SetError::invalid(token, "not a number"))
}

fn parse_digits(token: &str, digits: &str) -> Result<u64, SetError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SetError::invalid(token, "not a number"));
    }
    digits
        .parse::<u64>()
        .map_err(|_| SetError::invalid(token, "number is too large"))
}

/// Byte size with optional `k`/`K`, `m`/`M` or `g`/`G` suffix (powers of 1024).
pub fn parse_size(token: &str) -> Result<u64, SetError> {
    let (digits, scale) = match token.as_bytes().last() {
        Some(b'k' | b'K') => (&token[..token.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&token[..token.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&token[..token.len() - 1], 1024 * 1024 * 1024),
        _ => (token, 1),
    };
    parse_digits(token, digits)?
        .checked_mul(scale)
        .ok_or_else(|| SetError::invalid(token, "size is too large"))
}

/// Duration such as `30s`, `1h30m`, `500ms` or a bare number in `bare` units.
pub fn parse_time(token: &str, bare: TimeUnit) -> Result<Duration, SetError> {
    let mut rest = token.trim();
    if rest.is_empty() {
        return Err(SetError::invalid(token, "empty time value"));
    }

    let mut total: u64 = 0;
    let mut next_unit = 0;

    while !rest.is_empty() {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let number = parse_digits(token, &rest[..end])?;
        rest = &rest[end..];

        let scale = if rest.is_empty() {
            match bare {
                TimeUnit::Seconds => MS_PER_SEC,
                TimeUnit::Millis => 1,
            }
        } else {
            let position = UNITS
                .iter()
                .enumerate()
                .skip(next_unit)
                .find(|(_, (suffix, _))| {
                    rest.starts_with(*suffix) && !(*suffix == "m" && rest.starts_with("ms"))
                })
                .map(|(i, _)| i);
            let Some(i) = position else {
                return Err(SetError::invalid(token, "unknown or out-of-order time unit"));
            };
            let (suffix, scale) = UNITS[i];
            rest = rest[suffix.len()..].trim_start();
            next_unit = i + 1;
            scale
        };

        total = number
            .checked_mul(scale)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| SetError::invalid(token, "time value is too large"))?;
    }

    Ok(Duration::from_millis(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(token: &str) -> Result<Duration, SetError> {
        parse_time(token, TimeUnit::Seconds)
    }

    #[test]
    fn test_time_units() {
        assert_eq!(secs("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(secs("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(secs("45").unwrap(), Duration::from_secs(45));
        assert_eq!(secs("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(secs("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(secs("2d").unwrap(), Duration::from_secs(2 * 86_400));
        assert_eq!(secs("1w").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(secs("1M").unwrap(), Duration::from_secs(30 * 86_400));
        assert_eq!(secs("1y").unwrap(), Duration::from_secs(365 * 86_400));
    }

    #[test]
    fn test_time_compound() {
        assert_eq!(secs("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(secs("1m 30s").unwrap(), Duration::from_secs(90));
        assert_eq!(secs("1s500ms").unwrap(), Duration::from_millis(1500));
        assert_eq!(secs("1m30").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_time_errors() {
        assert!(secs("10x").is_err());
        assert!(secs("").is_err());
        assert!(secs("s").is_err());
        assert!(secs("30m1h").is_err());
        assert!(secs("1s1s").is_err());
        assert!(secs("-5s").is_err());
        assert!(secs("99999999999999999999").is_err());
        assert!(secs("18446744073709551615y").is_err());
    }

    #[test]
    fn test_time_bare_millis() {
        assert_eq!(parse_time("250", TimeUnit::Millis).unwrap(), Duration::from_millis(250));
        assert_eq!(parse_time("2s", TimeUnit::Millis).unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_size() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("1k").unwrap(), 1024);
        assert_eq!(parse_size("1K").unwrap(), 1024);
        assert_eq!(parse_size("2m").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("2M").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1g").unwrap(), 1024 * 1024 * 1024);
        assert!(parse_size("1t").is_err());
        assert!(parse_size("k").is_err());
        assert!(parse_size("").is_err());
        assert!(parse_size("18446744073709551615k").is_err());
    }

    #[test]
    fn test_flag() {
        assert_eq!(parse_flag("on"), Ok(true));
        assert_eq!(parse_flag("off"), Ok(false));
        assert!(matches!(parse_flag("yes"), Err(SetError::Invalid { .. })));
        for token in ["ON", "Off", "OFF"] {
            assert!(matches!(
                parse_flag(token),
                Err(SetError::Invalid { token: t, .. }) if t == token
            ));
        }
    }

    #[test]
    fn test_int() {
        assert_eq!(parse_int("-12").unwrap(), -12);
        assert!(parse_int("12a").is_err());
    }
}
