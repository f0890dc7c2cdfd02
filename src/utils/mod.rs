/// Utility modules for common functionality
pub mod locale;
pub mod messages;
pub mod timezone;
