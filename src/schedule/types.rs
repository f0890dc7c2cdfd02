use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use std::str::FromStr;

/// Identity of a scheduled job; at most one job per name may be registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobName {
    DayReminder,
    PreEventReminder,
    Heartbeat,
}

impl JobName {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobName::DayReminder => "day_reminder",
            JobName::PreEventReminder => "pre_event_reminder",
            JobName::Heartbeat => "heartbeat",
        }
    }
}

impl std::fmt::Display for JobName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of reminder batch to deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    Day,
    PreEvent,
}

impl ReminderKind {
    /// Argument form accepted by /sendreminder, matching the stored
    /// template keys ("day" and "15min")
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::Day => "day",
            ReminderKind::PreEvent => "15min",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "day" => Some(ReminderKind::Day),
            "15min" => Some(ReminderKind::PreEvent),
            _ => None,
        }
    }
}

/// A resolved weekly fire rule, ready for recurring scheduling
///
/// Derived from configuration on every resync, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireRule {
    pub day: Weekday,
    pub hour: u32,
    pub minute: u32,
}

impl FireRule {
    pub fn new(day: Weekday, hour: u32, minute: u32) -> Self {
        Self { day, hour, minute }
    }

    /// Six-field cron expression for this rule, e.g. "0 45 14 * * TUE"
    pub fn cron_expression(&self) -> String {
        format!("0 {} {} * * {}", self.minute, self.hour, cron_day(self.day))
    }

    pub fn to_schedule(&self) -> Result<cron::Schedule, cron::error::Error> {
        cron::Schedule::from_str(&self.cron_expression())
    }

    /// Next instant strictly after `now` at which this rule fires in `tz`
    ///
    /// This is the exact evaluation the job runner uses, so previews built
    /// from it always match the real firing time.
    pub fn next_fire(&self, tz: Tz, now: DateTime<Utc>) -> Option<DateTime<Tz>> {
        let schedule = self.to_schedule().ok()?;
        schedule.after(&now.with_timezone(&tz)).next()
    }

    pub fn time_hhmm(&self) -> String {
        crate::utils::timezone::format_hhmm(self.hour, self.minute)
    }
}

/// Cron day-of-week token for a chrono weekday
fn cron_day(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};
    use chrono_tz::Europe::Bucharest;

    #[test]
    fn test_job_name_strings() {
        assert_eq!(JobName::DayReminder.as_str(), "day_reminder");
        assert_eq!(JobName::PreEventReminder.as_str(), "pre_event_reminder");
        assert_eq!(JobName::Heartbeat.as_str(), "heartbeat");
    }

    #[test]
    fn test_reminder_kind_parse() {
        assert_eq!(ReminderKind::parse("day"), Some(ReminderKind::Day));
        assert_eq!(ReminderKind::parse("15min"), Some(ReminderKind::PreEvent));
        assert_eq!(ReminderKind::parse("hourly"), None);
    }

    #[test]
    fn test_cron_expression() {
        let rule = FireRule::new(Weekday::Tue, 14, 45);
        assert_eq!(rule.cron_expression(), "0 45 14 * * TUE");
        assert!(rule.to_schedule().is_ok());
    }

    #[test]
    fn test_next_fire_matches_rule() {
        // Wednesday 2025-08-06 12:00 local; rule fires Tuesday 15:00
        let now = Bucharest
            .with_ymd_and_hms(2025, 8, 6, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let rule = FireRule::new(Weekday::Tue, 15, 0);
        let next = rule.next_fire(Bucharest, now).unwrap();
        assert_eq!(next.weekday(), Weekday::Tue);
        assert_eq!((next.hour(), next.minute()), (15, 0));
        assert_eq!(
            next,
            Bucharest.with_ymd_and_hms(2025, 8, 12, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_fire_is_strictly_after_now() {
        // At the exact firing minute, the next fire is one week ahead
        let now = Bucharest
            .with_ymd_and_hms(2025, 8, 5, 15, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let rule = FireRule::new(Weekday::Tue, 15, 0);
        let next = rule.next_fire(Bucharest, now).unwrap();
        assert_eq!(
            next,
            Bucharest.with_ymd_and_hms(2025, 8, 12, 15, 0, 0).unwrap()
        );
    }
}
