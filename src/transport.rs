use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::POLL_TIMEOUT_SECS;

/// Error delivering a message to one recipient
#[derive(Debug)]
pub enum DeliveryError {
    Http(reqwest::Error),
    Api(String),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Http(err) => write!(f, "Transport HTTP error: {}", err),
            DeliveryError::Api(desc) => write!(f, "Transport API error: {}", desc),
        }
    }
}

impl std::error::Error for DeliveryError {}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Http(err)
    }
}

/// Outbound message delivery to a recipient identified by an opaque chat id
///
/// The scheduling engine and dispatcher only see this seam, never the
/// underlying chat protocol.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// Telegram Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub chat: TgChat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

#[derive(Debug, Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: i64,
    allowed_updates: [&'static str; 1],
}

/// HTTP client for the Telegram Bot API
pub struct TelegramTransport {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramTransport {
    pub fn new(bot_token: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        })
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<TgUpdate>, DeliveryError> {
        let params = GetUpdatesParams {
            offset,
            timeout: POLL_TIMEOUT_SECS,
            allowed_updates: ["message"],
        };
        let resp: ApiResponse<Vec<TgUpdate>> = self
            .client
            .post(format!("{}/getUpdates", self.base_url))
            .json(&params)
            .send()
            .await?
            .json()
            .await?;
        if !resp.ok {
            return Err(DeliveryError::Api(
                resp.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(resp.result.unwrap_or_default())
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        let params = SendMessageParams { chat_id, text };
        let resp: ApiResponse<serde_json::Value> = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&params)
            .send()
            .await?
            .json()
            .await?;
        if !resp.ok {
            return Err(DeliveryError::Api(
                resp.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }
}
