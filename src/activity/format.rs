use chrono::{DateTime, Utc};

use crate::types::ActivityEvent;

const MINUTES_IN_HOUR: f64 = 60.0;
const MINUTES_IN_DAY: f64 = 1440.0;
const MINUTES_IN_MONTH: f64 = 43200.0;

/// "5 minutes ago", "about 2 hours ago", "in 3 days".
pub fn relative_time(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - instant).num_seconds();
    let words = distance_in_words(seconds.unsigned_abs());
    if seconds >= 0 {
        format!("{words} ago")
    } else {
        format!("in {words}")
    }
}

pub fn headline(event: &ActivityEvent) -> String {
    format!("{} {} {}", event.action.glyph(), event.user_name, event.description)
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

fn distance_in_words(seconds: u64) -> String {
    if seconds < 30 {
        return "less than a minute".to_string();
    }

    let minutes = (seconds as f64 / 60.0).round();
    if minutes < 45.0 {
        return plural(minutes.max(1.0) as u64, "minute");
    }
    if minutes < 90.0 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        let hours = (minutes / MINUTES_IN_HOUR).round() as u64;
        return format!("about {}", plural(hours, "hour"));
    }
    if minutes < 2520.0 {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        return plural((minutes / MINUTES_IN_DAY).round() as u64, "day");
    }

    let months = (minutes / MINUTES_IN_MONTH).round() as u64;
    if minutes < MINUTES_IN_MONTH * 2.0 {
        return format!("about {}", plural(months, "month"));
    }
    if months < 12 {
        return plural(months, "month");
    }

    let years = months / 12;
    match months % 12 {
        0..3 => format!("about {}", plural(years, "year")),
        3..9 => format!("over {}", plural(years, "year")),
        _ => format!("almost {}", plural(years + 1, "year")),
    }
}
