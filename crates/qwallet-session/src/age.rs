//! Human-relative rendering of the last scan time.

use chrono::{DateTime, Utc};

/// Render the age of `last` relative to `now`, e.g. `"5 seconds ago"`.
///
/// Returns an empty string when there has been no scan. Instants in the
/// future (clock skew) read as `"just now"`.
pub fn describe_age(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last else {
        return String::new();
    };
    let secs = now.signed_duration_since(last).num_seconds();
    if secs < 1 {
        return "just now".to_string();
    }
    let (amount, unit) = match secs {
        s if s < 60 => (s, "second"),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s => (s / 86_400, "day"),
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("{amount} {unit}{plural} ago")
}
