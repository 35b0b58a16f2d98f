//! Minimal Telegram Bot API client: the chat transport the bot talks through.
//!
//! Only the calls the bot needs are implemented: `getUpdates` for long
//! polling, `sendMessage` for replies, and `setWebhook` / `deleteWebhook`
//! to switch between delivery modes.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use std::time::Duration;

use crate::{
    config::TelegramSettings,
    model::{ChatId, IncomingMessage, OutgoingMessage},
};

/// Extra time on top of the long-poll timeout before the HTTP call gives up.
const HTTP_GRACE_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API error: {description}")]
    Api { description: String },
    #[error("Failed to decode Telegram response: {0}")]
    Decode(String),
}

/// Outbound side of a chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), TelegramError>;
}

/// One entry of `getUpdates`, also the body of a webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

impl Update {
    /// The text message carried by this update; `None` for anything else.
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        let message = self.message?;
        Some(IncomingMessage {
            chat_id: message.chat.id,
            text: message.text?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    /// `{api_base}/bot{token}`; never logged.
    base_url: String,
    poll_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(token: &str, settings: &TelegramSettings) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.poll_timeout_secs + HTTP_GRACE_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", settings.api_base.trim_end_matches('/'), token),
            poll_timeout_secs: settings.poll_timeout_secs,
        })
    }

    /// Long-polls for updates newer than `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let mut body = json!({
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        self.call("getUpdates", &body).await
    }

    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), TelegramError> {
        let mut body = json!({ "url": url, "allowed_updates": ["message"] });
        if let Some(secret) = secret_token {
            body["secret_token"] = json!(secret);
        }

        let _: bool = self.call("setWebhook", &body).await?;
        Ok(())
    }

    /// Removes any registered webhook; Telegram rejects `getUpdates` while one is set.
    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let _: bool = self.call("deleteWebhook", &json!({})).await?;
        Ok(())
    }

    async fn call<T, B>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let res = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        let parsed: ApiResponse<T> = serde_json::from_str(&text)
            .map_err(|err| TelegramError::Decode(format!("{method} (status {status}): {err}")))?;

        if !parsed.ok {
            return Err(TelegramError::Api {
                description: parsed
                    .description
                    .unwrap_or_else(|| format!("{method} failed with status {status}")),
            });
        }

        parsed
            .result
            .ok_or_else(|| TelegramError::Decode(format!("{method}: response has no result")))
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), TelegramError> {
        let _: serde_json::Value = self.call("sendMessage", message).await?;
        Ok(())
    }
}
