/// Name of the configuration document inside the data directory
pub const CONFIG_FILE: &str = "config.json";

/// Name of the participant database document inside the data directory
pub const DATABASE_FILE: &str = "database.json";

/// Webinar day used when no configuration exists yet
pub const DEFAULT_WEBINAR_DAY: &str = "Tuesday";

/// Webinar time used when no configuration exists yet
pub const DEFAULT_WEBINAR_TIME: &str = "15:00";

/// Timezone used when no configuration exists yet
pub const DEFAULT_TIMEZONE: &str = "Europe/Bucharest";

/// Hour and minute of the day reminder when no override is configured
pub const DEFAULT_DAY_REMINDER_TIME: (u32, u32) = (9, 0);

/// The pre-event reminder always fires this many minutes before the webinar
pub const PRE_EVENT_LEAD_MINUTES: u32 = 15;

/// Cron expression for the liveness heartbeat (every 10 minutes)
pub const HEARTBEAT_CRON: &str = "0 */10 * * * *";

/// Long-poll timeout for Telegram getUpdates, in seconds
pub const POLL_TIMEOUT_SECS: i64 = 30;

/// Log directive for the application
pub const LOG_DIRECTIVE: &str = "webibot_rs=info";
