use chrono::{DateTime, Utc};

/// Format a byte count for display (`845 KB`, `2.4 MB`).
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{} KB", b / KB),
        b => format!("{} B", b),
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

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 && date.is_char_boundary(10) {
        // YYYY-MM-DD prefix of a naive timestamp
        date[..10].to_string()
    } else {
        date.to_string()
    }
}

/// "2 hours ago" style age, relative to `now`.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {} ago", unit)
        } else {
            format!("{} {}s ago", n, unit)
        }
    };
    match minutes {
        m if m < 60 => plural(m, "minute"),
        m if m < 1440 => plural(m / 60, "hour"),
        m => plural(m / 1440, "day"),
    }
}

/// Two-letter avatar initials: first letters of the first two words,
/// or the first two letters of a single word.
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let letters: String = match words.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(2).collect(),
        [first, second, ..] => first.chars().take(1).chain(second.chars().take(1)).collect(),
    };
    letters.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(12), "12 B");
        assert_eq!(format_bytes(12 * 1024), "12 KB");
        assert_eq!(format_bytes(845 * 1024 + 10), "845 KB");
        assert_eq!(format_bytes(2_516_582), "2.4 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Ünïcödé text", 6), "Ünï...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-01-15T10:00:00Z"), "Jan 15, 2025");
        assert_eq!(format_date("2023-10-26T08:00:00"), "2023-10-26");
        assert_eq!(format_date("2023-10-26"), "2023-10-26");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn test_format_relative() {
        let now = Utc::now();
        assert_eq!(format_relative(now, now), "just now");
        assert_eq!(format_relative(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(format_relative(now - Duration::hours(2), now), "2 hours ago");
        assert_eq!(format_relative(now - Duration::days(1), now), "1 day ago");
        // Clock skew reads as just now
        assert_eq!(format_relative(now + Duration::minutes(5), now), "just now");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Olivia Rhye"), "OR");
        assert_eq!(initials("admin"), "AD");
        assert_eq!(initials(""), "");
    }
}
