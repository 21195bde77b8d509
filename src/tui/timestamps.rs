use chrono::{DateTime, Datelike, Local, Utc};

/// Format a message time with tiered display, in local time:
/// - Today: "14:05"
/// - Within 7 days: "Mon 14:05"
/// - Same year: "Jan 15 14:05"
/// - Older: "Dec 3, 2024"
pub fn format_message_time(timestamp: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let local = timestamp.with_timezone(&Local);
    let local_now = now.with_timezone(&Local);

    if local.date_naive() == local_now.date_naive() {
        local.format("%H:%M").to_string()
    } else if now.signed_duration_since(*timestamp).num_days() < 7 {
        local.format("%a %H:%M").to_string()
    } else if local.year() == local_now.year() {
        local.format("%b %-d %H:%M").to_string()
    } else {
        local.format("%b %-d, %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_same_day_shows_clock_only() {
        let now = Utc::now();
        let formatted = format_message_time(&now, &now);
        assert_eq!(formatted.len(), 5);
        assert_eq!(formatted.chars().nth(2), Some(':'));
    }

    #[test]
    fn test_recent_shows_weekday() {
        let now = Utc::now();
        let timestamp = now - Duration::days(3);
        let formatted = format_message_time(&timestamp, &now);
        let weekday = timestamp.with_timezone(&Local).format("%a").to_string();
        assert!(formatted.starts_with(&weekday));
    }

    #[test]
    fn test_older_includes_year() {
        let now = Utc::now();
        let timestamp = now - Duration::days(400);
        let formatted = format_message_time(&timestamp, &now);
        assert!(formatted.contains(&timestamp.with_timezone(&Local).year().to_string()));
    }
}
