use chrono::{DateTime, Utc};

/// Format an RFC 3339 timestamp as "Dec 2, 2025".
/// Unparseable input is returned unchanged.
pub fn format_date(date: &str) -> String {
    match DateTime::parse_from_rfc3339(date) {
        Ok(dt) => format_timestamp(&dt.with_timezone(&Utc)),
        Err(_) => date.to_string(),
    }
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y").to_string()
}

/// Describe how long before `now` the timestamp `then` was, in whole days:
/// "Today", "Yesterday", "3 days ago", "2 weeks ago", "5 months ago",
/// "7 years ago". Future timestamps read as "Today".
pub fn format_relative(then: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let days = now.signed_duration_since(*then).num_days();
    match days {
        i64::MIN..=0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{} days ago", days),
        7..=29 => format!("{} weeks ago", days / 7),
        30..=364 => format!("{} months ago", days / 30),
        _ => format!("{} years ago", days / 365),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// "unknown" for empty API strings such as a character's `type`.
pub fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}
