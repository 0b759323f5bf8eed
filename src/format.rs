use chrono::{DateTime, Utc};

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Compact engagement count: `1.2K`, `3.4M`.
pub fn format_count(count: Option<u64>) -> String {
    match count {
        None | Some(0) => "0".to_string(),
        Some(n) if n >= 1_000_000 => tenths(n, 1_000_000, 'M'),
        Some(n) if n >= 1_000 => tenths(n, 1_000, 'K'),
        Some(n) => n.to_string(),
    }
}

// Rounds to one decimal with halves going up: 1_250 is 1.3K.
fn tenths(n: u64, unit: u64, suffix: char) -> String {
    let step = unit / 10;
    let tenths = (n + step / 2) / step;
    format!("{}.{}{}", tenths / 10, tenths % 10, suffix)
}

/// Full count with thousands separators: `1,234,567`.
pub fn format_grouped(count: Option<u64>) -> String {
    let digits = count.unwrap_or(0).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Age of a tweet as shown on feed cards.
pub fn format_relative(date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(date) = date else {
        return String::new();
    };
    let hours = (now - date).num_milliseconds().div_euclid(MS_PER_HOUR);
    let days = hours.div_euclid(24);

    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        date.format("%b %-d").to_string()
    }
}

/// Full timestamp for the detail view: `January 5, 2024 at 02:30 PM`.
pub fn format_long(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%B %-d, %Y at %I:%M %p").to_string())
        .unwrap_or_default()
}
