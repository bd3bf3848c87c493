use chrono::{DateTime, NaiveDateTime};

/// Remove anything that looks like an HTML tag, leaving the text content.
pub fn strip_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Keep the first `keep` characters and append "..." when anything was cut.
pub fn ellipsize(s: &str, keep: usize) -> String {
    if s.chars().count() <= keep {
        s.to_string()
    } else {
        let kept: String = s.chars().take(keep).collect();
        format!("{}...", kept)
    }
}

/// Format a feed date as `dd/mm/YYYY`.
/// Accepts RFC 3339, RFC 2822 and `YYYY-MM-DD HH:MM:SS`; anything else is returned as-is.
pub fn format_date(date: &str) -> String {
    const OUTPUT: &str = "%d/%m/%Y";

    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        dt.format(OUTPUT).to_string()
    } else if let Ok(dt) = DateTime::parse_from_rfc2822(date) {
        dt.format(OUTPUT).to_string()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S") {
        dt.format(OUTPUT).to_string()
    } else {
        date.to_string()
    }
}

/// Human-readable age for a number of elapsed minutes.
pub fn age_display(minutes: i64) -> String {
    if minutes < 1 {
        // Negative covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        let remaining_mins = minutes % 60;
        if remaining_mins >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        let remaining_hours = (minutes % 1440) / 60;
        if remaining_hours >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}
