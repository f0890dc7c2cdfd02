/// Pure message-template and display formatting helpers (transport-agnostic)
use chrono::{DateTime, NaiveDate, Utc, Weekday};

use crate::config::{BotConfig, ConfigError};
use crate::schedule::time_math;
use crate::utils::locale::{day_name_ro, format_webinar_date};
use crate::utils::timezone::format_hhmm;

/// Resolved next-webinar values substituted into message templates
#[derive(Debug, Clone)]
pub struct WebinarDate {
    /// Formatted date, e.g. "12 august 2025"
    pub formatted: String,
    /// Localized weekday name, e.g. "marți"
    pub day_name: String,
    /// Wall-clock time of the webinar, e.g. "15:00"
    pub time: String,
}

impl WebinarDate {
    pub fn new(date: NaiveDate, day: Weekday, time: String) -> Self {
        Self {
            formatted: format_webinar_date(date),
            day_name: day_name_ro(day).to_string(),
            time,
        }
    }

    /// Compute the next webinar occurrence from the current configuration
    pub fn compute(config: &BotConfig, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let spec = config.schedule_spec()?;
        let next = time_math::next_occurrence(
            spec.event_day,
            spec.event_hour,
            spec.event_minute,
            spec.tz,
            now,
        )?;
        Ok(Self::new(
            next.date_naive(),
            spec.event_day,
            format_hhmm(spec.event_hour, spec.event_minute),
        ))
    }
}

/// Substitute the schedule placeholders into a message template
pub fn render_schedule_placeholders(template: &str, webinar: &WebinarDate) -> String {
    template
        .replace("{next_webinar_date}", &webinar.formatted)
        .replace("{webinar_day}", &webinar.day_name)
        .replace("{webinar_time}", &webinar.time)
}

/// Substitute the personal and schedule placeholders into a welcome template
pub fn render_welcome(
    template: &str,
    first_name: &str,
    last_name: &str,
    webinar: &WebinarDate,
) -> String {
    let personalized = template
        .replace("{first_name}", first_name)
        .replace("{last_name}", last_name);
    render_schedule_placeholders(&personalized, webinar)
}

/// Format a signed delta in seconds as a relative Romanian phrase
///
/// Negative deltas render as "(în trecut)"; otherwise "în 2d 3h 5m" with
/// minutes always present when no larger unit is.
pub fn format_relative(total_seconds: i64) -> String {
    if total_seconds < 0 {
        return "(în trecut)".to_string();
    }
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{}m", minutes));
    }
    format!("în {}", parts.join(" "))
}
