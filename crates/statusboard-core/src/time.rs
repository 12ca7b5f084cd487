use chrono::{DateTime, NaiveDateTime, Utc};

/// Wire format of log timestamps: UTC, second resolution, literal `Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse a log timestamp. Returns `None` for anything not in
/// [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Current wall-clock time in log format.
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}
