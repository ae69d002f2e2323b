use chrono::Utc;

/// Current UTC wall-clock time in milliseconds, as a string. Used
/// to build the correlation id the device firmware expects in the
/// command headers.
pub fn millis_timestamp() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Convert whole seconds into fractional minutes for the audit
/// records, which store durations in minutes.
pub fn secs_to_minutes(seconds: f64) -> f64 {
    seconds / 60.0
}
