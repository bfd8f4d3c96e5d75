use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Relative age of a story, e.g. "3d ago", measured against the current time.
pub fn relative_age(published: Option<DateTime<Utc>>) -> String {
    format_age(published, Utc::now())
}

/// Coarse age of `published` as seen from `now`.
///
/// Whole days win over hours, hours over minutes. Anything under a minute,
/// and any timestamp in the future, reads "just now".
pub fn format_age(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(published) = published else {
        return "unknown".to_string();
    };

    let elapsed = (now - published).num_seconds();
    if elapsed <= 0 {
        return "just now".to_string();
    }

    let days = elapsed / SECONDS_PER_DAY;
    let remainder = elapsed % SECONDS_PER_DAY;

    if days > 0 {
        format!("{}d ago", days)
    } else if remainder >= 3600 {
        format!("{}h ago", remainder / 3600)
    } else if remainder >= 60 {
        format!("{}m ago", remainder / 60)
    } else {
        "just now".to_string()
    }
}
