use chrono::{DateTime, Local, Utc};

/// Get current Unix timestamp (milliseconds)
pub fn current_unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a Unix timestamp (milliseconds) as RFC 3339 in the local offset.
///
/// Out-of-range values fall back to the Unix epoch.
pub fn timestamp_to_local_rfc3339(millis: i64) -> String {
    let utc = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default();
    utc.with_timezone(&Local).to_rfc3339()
}
