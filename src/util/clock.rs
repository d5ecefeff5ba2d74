//! Wall-clock helpers: millisecond epoch internally, RFC3339 UTC outside.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Render an epoch-millisecond timestamp as an ISO-8601 UTC string.
pub fn iso(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .expect("timestamp in range")
        .format(&Rfc3339)
        .expect("rfc3339 format")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_renders_utc() {
        assert_eq!(iso(0), "1970-01-01T00:00:00Z");
        assert_eq!(iso(86_400_000), "1970-01-02T00:00:00Z");
        assert!(iso(1_500).starts_with("1970-01-01T00:00:01.5"));
        assert!(iso(1_500).ends_with('Z'));
    }

    #[test]
    fn now_is_recent() {
        assert!(now_ms() > 1_700_000_000_000);
    }
}
