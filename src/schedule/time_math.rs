/// Pure weekly-occurrence arithmetic (timezone-aware where stated)
///
/// All day-of-week math for the bot lives here; other modules must not
/// reimplement modulo-7 logic.
use chrono::{DateTime, Datelike, Days, LocalResult, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::utils::timezone::TimezoneError;

/// Number of days from `current` forward to `target`, in 0..=6
pub fn days_until(current: Weekday, target: Weekday) -> u32 {
    (target.num_days_from_monday() as i64 - current.num_days_from_monday() as i64).rem_euclid(7)
        as u32
}

/// Earliest instant at or after `now`, expressed in `tz`, falling on `day`
/// at `hour:minute`.
///
/// "Already passed" is decided by comparing `now`'s local (hour, minute)
/// against the target with strict `>`: the exact boundary minute still
/// resolves to the current day, not next week.
pub fn next_occurrence(
    day: Weekday,
    hour: u32,
    minute: u32,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<DateTime<Tz>, TimezoneError> {
    let local = now.with_timezone(&tz);

    let mut days_ahead = days_until(local.weekday(), day);
    if days_ahead == 0 && (local.hour(), local.minute()) > (hour, minute) {
        days_ahead = 7;
    }

    let date = local
        .date_naive()
        .checked_add_days(Days::new(days_ahead as u64))
        .ok_or(TimezoneError::TimeDoesNotExist)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| TimezoneError::InvalidTime(format!("{}:{}", hour, minute)))?;

    match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt),
        // Use the earliest instant during a DST fold
        LocalResult::Ambiguous(dt, _) => Ok(dt),
        LocalResult::None => Err(TimezoneError::TimeDoesNotExist),
    }
}

/// Subtract `lead_minutes` from a wall-clock (hour, minute, day) triple with
/// minute, hour, and day rollover.
///
/// Total for `lead_minutes` < 60: every valid input produces a valid output;
/// Monday's predecessor wraps to Sunday. No timezone awareness.
pub fn derive_lead_time(
    hour: u32,
    minute: u32,
    day: Weekday,
    lead_minutes: u32,
) -> (u32, u32, Weekday) {
    let mut minute = minute as i32 - lead_minutes as i32;
    let mut hour = hour as i32;
    let mut day = day;
    if minute < 0 {
        minute += 60;
        hour -= 1;
        if hour < 0 {
            hour = 23;
            day = day.pred();
        }
    }
    (hour as u32, minute as u32, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Bucharest;
    use chrono_tz::Tz;

    fn at(tz: Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        tz.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_days_until() {
        assert_eq!(days_until(Weekday::Mon, Weekday::Mon), 0);
        assert_eq!(days_until(Weekday::Mon, Weekday::Sun), 6);
        assert_eq!(days_until(Weekday::Sun, Weekday::Mon), 1);
        assert_eq!(days_until(Weekday::Fri, Weekday::Tue), 4);
    }

    #[test]
    fn test_next_occurrence_same_day_before_time() {
        // Tuesday 2025-08-05 10:00 local, target Tuesday 15:00: same day
        let now = at(Bucharest, 2025, 8, 5, 10, 0);
        let next = next_occurrence(Weekday::Tue, 15, 0, Bucharest, now).unwrap();
        assert_eq!(next, Bucharest.with_ymd_and_hms(2025, 8, 5, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_same_day_after_time() {
        // Tuesday 16:00 local, target Tuesday 15:00: next week
        let now = at(Bucharest, 2025, 8, 5, 16, 0);
        let next = next_occurrence(Weekday::Tue, 15, 0, Bucharest, now).unwrap();
        assert_eq!(next, Bucharest.with_ymd_and_hms(2025, 8, 12, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_exact_boundary_resolves_to_now() {
        // Exactly Tuesday 15:00: still this week's occurrence
        let now = at(Bucharest, 2025, 8, 5, 15, 0);
        let next = next_occurrence(Weekday::Tue, 15, 0, Bucharest, now).unwrap();
        assert_eq!(next, Bucharest.with_ymd_and_hms(2025, 8, 5, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_earlier_weekday_wraps_forward() {
        // Friday 2025-08-08, target Tuesday: following Tuesday
        let now = at(Bucharest, 2025, 8, 8, 12, 0);
        let next = next_occurrence(Weekday::Tue, 15, 0, Bucharest, now).unwrap();
        assert_eq!(next, Bucharest.with_ymd_and_hms(2025, 8, 12, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_across_month_boundary() {
        // Thursday 2025-07-31, target Monday: lands on 2025-08-04
        let now = at(Bucharest, 2025, 7, 31, 8, 0);
        let next = next_occurrence(Weekday::Mon, 9, 30, Bucharest, now).unwrap();
        assert_eq!(next, Bucharest.with_ymd_and_hms(2025, 8, 4, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_across_year_boundary() {
        // Wednesday 2025-12-31, target Friday: lands on 2026-01-02
        let now = at(Bucharest, 2025, 12, 31, 20, 0);
        let next = next_occurrence(Weekday::Fri, 19, 0, Bucharest, now).unwrap();
        assert_eq!(next, Bucharest.with_ymd_and_hms(2026, 1, 2, 19, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_respects_timezone() {
        // 2025-08-05 13:30 UTC is 16:30 in Bucharest (UTC+3): the 15:00
        // local target has passed even though it has not in UTC
        let now = Utc.with_ymd_and_hms(2025, 8, 5, 13, 30, 0).unwrap();
        let next = next_occurrence(Weekday::Tue, 15, 0, Bucharest, now).unwrap();
        assert_eq!(next, Bucharest.with_ymd_and_hms(2025, 8, 12, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_within_seven_days() {
        let now = at(Bucharest, 2025, 8, 6, 11, 45);
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            let next = next_occurrence(day, 11, 45, Bucharest, now).unwrap();
            let delta = next.with_timezone(&Utc) - now;
            assert!(delta.num_seconds() >= 0, "{:?} is in the past", day);
            assert!(delta.num_days() < 7, "{:?} is more than a week away", day);
            assert_eq!(next.weekday(), day);
        }
    }

    #[test]
    fn test_derive_lead_time_no_underflow() {
        assert_eq!(derive_lead_time(15, 0, Weekday::Tue, 15), (14, 45, Weekday::Tue));
        assert_eq!(derive_lead_time(19, 30, Weekday::Wed, 15), (19, 15, Weekday::Wed));
    }

    #[test]
    fn test_derive_lead_time_minute_underflow() {
        assert_eq!(derive_lead_time(10, 5, Weekday::Fri, 15), (9, 50, Weekday::Fri));
    }

    #[test]
    fn test_derive_lead_time_hour_and_day_rollover() {
        // 00:10 Monday minus 15 minutes wraps to 23:55 Sunday
        assert_eq!(derive_lead_time(0, 10, Weekday::Mon, 15), (23, 55, Weekday::Sun));
        assert_eq!(derive_lead_time(0, 0, Weekday::Wed, 15), (23, 45, Weekday::Tue));
    }

    #[test]
    fn test_derive_lead_time_midnight_sunday_wraps_to_saturday() {
        assert_eq!(derive_lead_time(0, 5, Weekday::Sun, 15), (23, 50, Weekday::Sat));
    }
}
