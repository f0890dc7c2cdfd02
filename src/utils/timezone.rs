use chrono::NaiveTime;
use chrono_tz::Tz;

/// Error types for timezone operations
#[derive(Debug)]
pub enum TimezoneError {
    InvalidTimezone(String),
    InvalidTime(String),
    TimeDoesNotExist,
}

impl std::fmt::Display for TimezoneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimezoneError::InvalidTimezone(tz) => write!(f, "Invalid timezone: {}", tz),
            TimezoneError::InvalidTime(msg) => write!(f, "Invalid time format: {}", msg),
            TimezoneError::TimeDoesNotExist => {
                write!(f, "Time doesn't exist in this timezone (DST transition)")
            }
        }
    }
}

impl std::error::Error for TimezoneError {}

/// Parse a timezone string
pub fn parse_timezone(tz_str: &str) -> Result<Tz, TimezoneError> {
    tz_str
        .parse()
        .map_err(|_| TimezoneError::InvalidTimezone(tz_str.to_string()))
}

/// Parse a time string in HH:MM format
pub fn parse_time_string(time_str: &str) -> Result<NaiveTime, TimezoneError> {
    NaiveTime::parse_from_str(time_str, "%H:%M")
        .map_err(|_| TimezoneError::InvalidTime(format!("Expected HH:MM format, got '{}'", time_str)))
}

/// Parse a time string into an (hour, minute) pair
pub fn parse_hour_minute(time_str: &str) -> Result<(u32, u32), TimezoneError> {
    use chrono::Timelike;
    let time = parse_time_string(time_str)?;
    Ok((time.hour(), time.minute()))
}

/// Format an (hour, minute) pair as HH:MM
pub fn format_hhmm(hour: u32, minute: u32) -> String {
    format!("{:02}:{:02}", hour, minute)
}
