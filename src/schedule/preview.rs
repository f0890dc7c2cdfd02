use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;

use crate::config::BotConfig;
use crate::schedule::registry::ScheduleError;
use crate::schedule::time_math;
use crate::schedule::types::{FireRule, JobName};
use crate::utils::timezone::format_hhmm;

/// One resolved schedule entry: day, wall-clock time, and next fire instant
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub day: Weekday,
    pub time: String,
    pub next: DateTime<Tz>,
}

/// Read-only projection of the effective schedule for admin display
#[derive(Debug, Clone)]
pub struct SchedulePreview {
    pub timezone: Tz,
    pub event: Occurrence,
    pub day_reminder: Occurrence,
    pub pre_event_reminder: Occurrence,
}

fn rule_occurrence(
    name: JobName,
    rule: &FireRule,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<Occurrence, ScheduleError> {
    let next = rule
        .next_fire(tz, now)
        .ok_or(ScheduleError::NoUpcomingFire(name))?;
    Ok(Occurrence {
        day: rule.day,
        time: rule.time_hhmm(),
        next,
    })
}

/// Compute the next fire instant for the event and both reminders
///
/// Reminder instants go through the exact `FireRule` evaluation the job
/// runner uses, so what an admin sees is what will actually fire. Never
/// creates, mutates, or removes any registered job.
pub fn preview(config: &BotConfig, now: DateTime<Utc>) -> Result<SchedulePreview, ScheduleError> {
    let spec = config.schedule_spec()?;

    let event_next = time_math::next_occurrence(
        spec.event_day,
        spec.event_hour,
        spec.event_minute,
        spec.tz,
        now,
    )
    .map_err(|e| ScheduleError::Config(e.into()))?;

    Ok(SchedulePreview {
        timezone: spec.tz,
        event: Occurrence {
            day: spec.event_day,
            time: format_hhmm(spec.event_hour, spec.event_minute),
            next: event_next,
        },
        day_reminder: rule_occurrence(JobName::DayReminder, &spec.day_rule, spec.tz, now)?,
        pre_event_reminder: rule_occurrence(
            JobName::PreEventReminder,
            &spec.pre_event_rule,
            spec.tz,
            now,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DayReminderOverride;
    use crate::dispatch::test_support::MockTransport;
    use crate::schedule::registry::JobRegistry;
    use crate::store::JsonStore;
    use chrono::TimeZone;
    use chrono_tz::Europe::Bucharest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

    fn config() -> BotConfig {
        let mut config = BotConfig::default();
        config.webinar.day = "Tuesday".to_string();
        config.webinar.time = "15:00".to_string();
        config.webinar.timezone = "Europe/Bucharest".to_string();
        config
    }

    fn now() -> DateTime<Utc> {
        // Wednesday 2025-08-06 12:00 Bucharest
        Bucharest
            .with_ymd_and_hms(2025, 8, 6, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_preview_resolves_all_three_entries() {
        let p = preview(&config(), now()).unwrap();
        assert_eq!(p.timezone, Bucharest);

        assert_eq!(p.event.day, Weekday::Tue);
        assert_eq!(p.event.time, "15:00");
        assert_eq!(
            p.event.next,
            Bucharest.with_ymd_and_hms(2025, 8, 12, 15, 0, 0).unwrap()
        );

        assert_eq!(p.day_reminder.day, Weekday::Tue);
        assert_eq!(p.day_reminder.time, "09:00");
        assert_eq!(
            p.day_reminder.next,
            Bucharest.with_ymd_and_hms(2025, 8, 12, 9, 0, 0).unwrap()
        );

        assert_eq!(p.pre_event_reminder.day, Weekday::Tue);
        assert_eq!(p.pre_event_reminder.time, "14:45");
        assert_eq!(
            p.pre_event_reminder.next,
            Bucharest.with_ymd_and_hms(2025, 8, 12, 14, 45, 0).unwrap()
        );
    }

    #[test]
    fn test_preview_uses_day_reminder_override() {
        let mut config = config();
        config.reminders.day = Some(DayReminderOverride {
            day: "Monday".to_string(),
            time: "18:30".to_string(),
        });
        let p = preview(&config, now()).unwrap();
        assert_eq!(p.day_reminder.day, Weekday::Mon);
        assert_eq!(p.day_reminder.time, "18:30");
        assert_eq!(
            p.day_reminder.next,
            Bucharest.with_ymd_and_hms(2025, 8, 11, 18, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_preview_matches_registry_fire_times() {
        let dir = std::env::temp_dir().join(format!(
            "webibot_preview_test_{}_{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let registry = JobRegistry::new(
            Arc::new(JsonStore::new(&dir)),
            Arc::new(MockTransport::new(vec![])),
        );
        let config = config();
        registry.resync(&config).await.unwrap();

        let now = now();
        let p = preview(&config, now).unwrap();
        assert_eq!(
            p.day_reminder.next,
            registry.job_next_fire(JobName::DayReminder, now).unwrap()
        );
        assert_eq!(
            p.pre_event_reminder.next,
            registry
                .job_next_fire(JobName::PreEventReminder, now)
                .unwrap()
        );
    }

    #[test]
    fn test_preview_rejects_malformed_config() {
        let mut bad = config();
        bad.webinar.time = "quarter past".to_string();
        assert!(preview(&bad, now()).is_err());
    }
}
