use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DAY_REMINDER_TIME, DEFAULT_TIMEZONE, DEFAULT_WEBINAR_DAY, DEFAULT_WEBINAR_TIME,
    PRE_EVENT_LEAD_MINUTES,
};
use crate::schedule::time_math::derive_lead_time;
use crate::schedule::types::FireRule;
use crate::utils::locale::parse_day_name;
use crate::utils::timezone::{TimezoneError, parse_hour_minute, parse_timezone};

/// Error raised when a loaded configuration cannot be resolved into a schedule
///
/// Admin commands validate day names, times, and timezones before persisting,
/// so one of these surfacing here means the stored document was edited by
/// hand or corrupted.
#[derive(Debug)]
pub enum ConfigError {
    InvalidDay(String),
    InvalidTime(String),
    InvalidTimezone(String),
    NonexistentLocalTime,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidDay(day) => write!(f, "Invalid day name in config: {}", day),
            ConfigError::InvalidTime(time) => write!(f, "Invalid time in config: {}", time),
            ConfigError::InvalidTimezone(tz) => write!(f, "Invalid timezone in config: {}", tz),
            ConfigError::NonexistentLocalTime => {
                write!(f, "Configured time does not exist in the configured timezone")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<TimezoneError> for ConfigError {
    fn from(err: TimezoneError) -> Self {
        match err {
            TimezoneError::InvalidTimezone(tz) => ConfigError::InvalidTimezone(tz),
            TimezoneError::InvalidTime(msg) => ConfigError::InvalidTime(msg),
            TimezoneError::TimeDoesNotExist => ConfigError::NonexistentLocalTime,
        }
    }
}

/// The webinar event itself: day, wall-clock time, timezone, and join link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebinarConfig {
    #[serde(default = "default_day")]
    pub day: String,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Join link; opaque to the scheduling engine
    #[serde(default)]
    pub link: String,
}

impl Default for WebinarConfig {
    fn default() -> Self {
        Self {
            day: default_day(),
            time: default_time(),
            timezone: default_timezone(),
            link: String::new(),
        }
    }
}

fn default_day() -> String {
    DEFAULT_WEBINAR_DAY.to_string()
}

fn default_time() -> String {
    DEFAULT_WEBINAR_TIME.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// Explicit (day, time) override for the day reminder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayReminderOverride {
    pub day: String,
    pub time: String,
}

/// Reminder overrides; only the day reminder is configurable.
/// The pre-event reminder is always derived from the webinar time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<DayReminderOverride>,
}

/// Which stored message template a command or dispatch refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Welcome,
    Info,
    ReminderDay,
    Reminder15Min,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Welcome => "welcome",
            TemplateKind::Info => "info",
            TemplateKind::ReminderDay => "reminder_day",
            TemplateKind::Reminder15Min => "reminder_15min",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "welcome" => Some(TemplateKind::Welcome),
            "info" => Some(TemplateKind::Info),
            "reminder_day" => Some(TemplateKind::ReminderDay),
            "reminder_15min" => Some(TemplateKind::Reminder15Min),
            _ => None,
        }
    }
}

/// Message templates keyed by kind, with placeholder support
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplates {
    #[serde(default = "default_welcome")]
    pub welcome: String,
    #[serde(default = "default_info")]
    pub info: String,
    #[serde(default = "default_reminder_day")]
    pub reminder_day: String,
    #[serde(default = "default_reminder_15min")]
    pub reminder_15min: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            welcome: default_welcome(),
            info: default_info(),
            reminder_day: default_reminder_day(),
            reminder_15min: default_reminder_15min(),
        }
    }
}

impl MessageTemplates {
    pub fn get(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::Welcome => &self.welcome,
            TemplateKind::Info => &self.info,
            TemplateKind::ReminderDay => &self.reminder_day,
            TemplateKind::Reminder15Min => &self.reminder_15min,
        }
    }

    pub fn set(&mut self, kind: TemplateKind, text: String) {
        match kind {
            TemplateKind::Welcome => self.welcome = text,
            TemplateKind::Info => self.info = text,
            TemplateKind::ReminderDay => self.reminder_day = text,
            TemplateKind::Reminder15Min => self.reminder_15min = text,
        }
    }
}

fn default_welcome() -> String {
    "Salut {first_name}! Te-ai înscris la webinar. Următorul webinar are loc {webinar_day}, \
     {next_webinar_date}, la ora {webinar_time}."
        .to_string()
}

fn default_info() -> String {
    "Următorul webinar are loc {webinar_day}, {next_webinar_date}, la ora {webinar_time}."
        .to_string()
}

fn default_reminder_day() -> String {
    "Reminder: webinarul are loc {webinar_day}, {next_webinar_date}, la ora {webinar_time}."
        .to_string()
}

fn default_reminder_15min() -> String {
    "Reminder: webinarul începe în 15 minute, la ora {webinar_time}!".to_string()
}

/// External tabular-store integration toggle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_worksheet")]
    pub worksheet_name: String,
}

fn default_worksheet() -> String {
    "participants".to_string()
}

/// The full configuration document, as stored in config.json
///
/// Loaded fresh on every resync and dispatch; never mutated by the
/// scheduling engine. Defaulting rules live in `schedule_spec`, nowhere else.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub admin_ids: Vec<i64>,
    #[serde(default)]
    pub webinar: WebinarConfig,
    #[serde(default)]
    pub messages: MessageTemplates,
    #[serde(default)]
    pub reminders: ReminderOverrides,
    #[serde(default)]
    pub google_sheets: SheetsConfig,
}

/// A configuration resolved into concrete fire rules
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub tz: Tz,
    pub event_day: Weekday,
    pub event_hour: u32,
    pub event_minute: u32,
    pub day_rule: FireRule,
    pub pre_event_rule: FireRule,
}

impl BotConfig {
    /// Resolve the stored strings into a concrete schedule
    ///
    /// A missing day-reminder override defaults to the event day at 09:00;
    /// the pre-event rule is always the event time minus 15 minutes. Any
    /// unparseable field is an error, never a silently wrong schedule.
    pub fn schedule_spec(&self) -> Result<ScheduleSpec, ConfigError> {
        let tz = parse_timezone(&self.webinar.timezone)?;
        let event_day = parse_day_name(&self.webinar.day)
            .ok_or_else(|| ConfigError::InvalidDay(self.webinar.day.clone()))?;
        let (event_hour, event_minute) = parse_hour_minute(&self.webinar.time)?;

        let day_rule = match &self.reminders.day {
            Some(over) => {
                let day = parse_day_name(&over.day)
                    .ok_or_else(|| ConfigError::InvalidDay(over.day.clone()))?;
                let (hour, minute) = parse_hour_minute(&over.time)?;
                FireRule::new(day, hour, minute)
            }
            None => {
                let (hour, minute) = DEFAULT_DAY_REMINDER_TIME;
                FireRule::new(event_day, hour, minute)
            }
        };

        let (pre_hour, pre_minute, pre_day) = derive_lead_time(
            event_hour,
            event_minute,
            event_day,
            PRE_EVENT_LEAD_MINUTES,
        );

        Ok(ScheduleSpec {
            tz,
            event_day,
            event_hour,
            event_minute,
            day_rule,
            pre_event_rule: FireRule::new(pre_day, pre_hour, pre_minute),
        })
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}
