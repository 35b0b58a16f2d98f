use serde::{Deserialize, Serialize};

/// Placeholder used when the provider sends no weather description.
pub const NO_DESCRIPTION: &str = "Нет данных";

/// Telegram chat identifier; only used to route the reply.
pub type ChatId = i64;

/// A city lookup requested by a chat user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    pub city: String,
}

/// Current conditions as reported by the provider.
///
/// Numeric fields are `None` when the provider omitted them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub description: String,
    pub temperature_c: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub humidity_pct: Option<u8>,
    pub wind_speed_mps: Option<f64>,
}

/// Why a weather lookup produced no result.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather API key is not configured")]
    NotConfigured,
    #[error("no weather found for city '{city}'")]
    NotFound { city: String },
    #[error("weather provider unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("malformed weather provider response: {0}")]
    MalformedResponse(String),
}

/// Text message received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub text: String,
}

/// The single reply produced for an [`IncomingMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
}

/// Upper-cases the first character and leaves the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
