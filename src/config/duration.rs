//! Human-readable durations such as "500ms", "30s", "5m" or "1h".

use std::time::Duration;

/// Parse a duration string. A bare number is read as seconds.
///
/// Returns `None` for empty, negative or malformed input.
///
/// ```
/// use remote_deploy::config::parse_duration_string;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration_string("250ms"), Some(Duration::from_millis(250)));
/// assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_duration_string("15"), Some(Duration::from_secs(15)));
/// ```
pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<u64>().ok()?;

    match unit.trim() {
        "ms" => Some(Duration::from_millis(value)),
        "" | "s" => Some(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}
