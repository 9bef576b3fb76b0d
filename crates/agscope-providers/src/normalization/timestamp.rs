use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Keys probed for a record timestamp, in priority order
const TIMESTAMP_KEYS: &[&str] = &[
    "timestamp",
    "time",
    "ts",
    "created",
    "created_at",
    "createdAt",
    "datetime",
    "date",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Timestamp of a record, checking the top level first and then `payload`
pub fn find_timestamp(record: &Value) -> Option<DateTime<Utc>> {
    find_in_object(record).or_else(|| record.get("payload").and_then(find_in_object))
}

fn find_in_object(value: &Value) -> Option<DateTime<Utc>> {
    let obj = value.as_object()?;
    TIMESTAMP_KEYS
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(parse_timestamp_value)
}

pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(timestamp_from_epoch),
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

/// Parse RFC 3339, naive date-times (assumed UTC), bare dates, or numeric epochs
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return s.parse::<f64>().ok().and_then(timestamp_from_epoch);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Interpret an epoch number by magnitude: microseconds above 1e14,
/// milliseconds above 1e11, seconds otherwise
pub fn timestamp_from_epoch(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() || n < 0.0 {
        return None;
    }

    let secs = if n > 1e14 {
        n / 1e6
    } else if n > 1e11 {
        n / 1e3
    } else {
        n
    };

    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_epoch_magnitudes() {
        let expected = at(2025, 1, 15, 10, 0, 0);
        let secs = expected.timestamp() as f64;
        assert_eq!(timestamp_from_epoch(secs), Some(expected));
        assert_eq!(timestamp_from_epoch(secs * 1e3), Some(expected));
        assert_eq!(timestamp_from_epoch(secs * 1e6), Some(expected));
        assert_eq!(timestamp_from_epoch(-1.0), None);
    }

    #[test]
    fn test_string_forms() {
        let expected = at(2025, 1, 15, 10, 0, 0);
        assert_eq!(parse_timestamp_str("2025-01-15T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp_str("2025-01-15T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp_str("2025-01-15 10:00:00"), Some(expected));
        assert_eq!(parse_timestamp_str("2025-01-15T10:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp_str("1736935200"), Some(expected));
        assert_eq!(parse_timestamp_str("2025-01-15"), Some(at(2025, 1, 15, 0, 0, 0)));
        assert_eq!(parse_timestamp_str("yesterday"), None);
        assert_eq!(parse_timestamp_str(""), None);
    }

    #[test]
    fn test_key_priority_and_payload_fallback() {
        let record = json!({
            "created_at": "2025-01-15T11:00:00Z",
            "timestamp": "2025-01-15T10:00:00Z"
        });
        assert_eq!(find_timestamp(&record), Some(at(2025, 1, 15, 10, 0, 0)));

        let nested = json!({"type": "x", "payload": {"createdAt": 1736935200000u64}});
        assert_eq!(find_timestamp(&nested), Some(at(2025, 1, 15, 10, 0, 0)));

        let unparseable = json!({"timestamp": "soon", "ts": 1736935200});
        assert_eq!(find_timestamp(&unparseable), Some(at(2025, 1, 15, 10, 0, 0)));

        assert_eq!(find_timestamp(&json!({"text": "hi"})), None);
    }
}
