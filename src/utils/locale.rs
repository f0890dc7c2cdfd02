/// Romanian display names and day-name parsing (transport-agnostic)
use chrono::{Datelike, NaiveDate, Weekday};

/// Get the Romanian weekday name used in user-facing messages
pub fn day_name_ro(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "luni",
        Weekday::Tue => "marți",
        Weekday::Wed => "miercuri",
        Weekday::Thu => "joi",
        Weekday::Fri => "vineri",
        Weekday::Sat => "sâmbătă",
        Weekday::Sun => "duminică",
    }
}

/// Get the English weekday name as stored in the configuration document
pub fn day_name_en(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Get the Romanian month name from a month number (1-12)
pub fn month_name_ro(month: u32) -> &'static str {
    match month {
        1 => "ianuarie",
        2 => "februarie",
        3 => "martie",
        4 => "aprilie",
        5 => "mai",
        6 => "iunie",
        7 => "iulie",
        8 => "august",
        9 => "septembrie",
        10 => "octombrie",
        11 => "noiembrie",
        12 => "decembrie",
        _ => "necunoscut",
    }
}

/// Format a date as "12 august 2025" for the {next_webinar_date} placeholder
pub fn format_webinar_date(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        month_name_ro(date.month()),
        date.year()
    )
}

/// Parse a weekday from admin input, accepting English and Romanian names
///
/// Returns None for anything that is not a recognizable day name.
pub fn parse_day_name(name: &str) -> Option<Weekday> {
    match name.trim().to_lowercase().as_str() {
        "monday" | "luni" => Some(Weekday::Mon),
        "tuesday" | "marți" | "marti" => Some(Weekday::Tue),
        "wednesday" | "miercuri" => Some(Weekday::Wed),
        "thursday" | "joi" => Some(Weekday::Thu),
        "friday" | "vineri" => Some(Weekday::Fri),
        "saturday" | "sâmbătă" | "sambata" => Some(Weekday::Sat),
        "sunday" | "duminică" | "duminica" => Some(Weekday::Sun),
        _ => None,
    }
}
