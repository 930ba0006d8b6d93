use crate::utils::{GateError, GateResult};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

const TTL_FORMAT_HINT: &str = "Invalid TTL format. Use: 30m, 2h, 1d";

/// Parses `<digits>[mhd]` into milliseconds
pub fn parse_ttl(ttl: &str) -> GateResult<i64> {
    let invalid = || GateError::InvalidTtl(TTL_FORMAT_HINT.to_string());

    let unit = ttl.chars().last().ok_or_else(invalid)?;
    let amount = &ttl[..ttl.len() - unit.len_utf8()];
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let multiplier = match unit {
        'm' => MINUTE_MS,
        'h' => HOUR_MS,
        'd' => DAY_MS,
        _ => return Err(invalid()),
    };

    amount
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}

/// Parses an optional TTL flag; absent means permanent
pub fn parse_optional_ttl(ttl: Option<&str>) -> GateResult<Option<i64>> {
    ttl.map(parse_ttl).transpose()
}

/// Time left before `expires_at`, rounded to the largest sensible unit
pub fn format_remaining(expires_at: Option<i64>, now: i64) -> String {
    let Some(expires_at) = expires_at else {
        return "Never".to_string();
    };
    if expires_at <= now {
        return "Expired".to_string();
    }

    let minutes = round_div(expires_at - now, MINUTE_MS);
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let hours = round_div(minutes, 60);
    if hours < 24 {
        return format!("{}h", hours);
    }
    format!("{}d", round_div(hours, 24))
}

fn round_div(value: i64, divisor: i64) -> i64 {
    (value + divisor / 2) / divisor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_unit() {
        assert_eq!(parse_ttl("30m").unwrap(), 30 * 60_000);
        assert_eq!(parse_ttl("2h").unwrap(), 7_200_000);
        assert_eq!(parse_ttl("1d").unwrap(), 86_400_000);
        assert_eq!(parse_ttl("0m").unwrap(), 0);
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in ["", "m", "30", "30s", "1.5h", "-1h", " 1h", "1h ", "1hh", "h1", "１h"] {
            let err = parse_ttl(bad).unwrap_err();
            assert!(matches!(err, GateError::InvalidTtl(_)), "{:?}", bad);
            assert_eq!(err.to_string(), TTL_FORMAT_HINT);
        }
    }

    #[test]
    fn rejects_overflow() {
        assert!(parse_ttl("99999999999999999d").is_err());
    }

    #[test]
    fn optional_ttl() {
        assert_eq!(parse_optional_ttl(None).unwrap(), None);
        assert_eq!(parse_optional_ttl(Some("1h")).unwrap(), Some(3_600_000));
        assert!(parse_optional_ttl(Some("soon")).is_err());
    }

    #[test]
    fn remaining_time_formatting() {
        assert_eq!(format_remaining(None, 0), "Never");
        assert_eq!(format_remaining(Some(100), 100), "Expired");
        assert_eq!(format_remaining(Some(30 * MINUTE_MS), 0), "30m");
        assert_eq!(format_remaining(Some(90 * MINUTE_MS), 0), "2h");
        assert_eq!(format_remaining(Some(3 * DAY_MS), 0), "3d");
    }
}
