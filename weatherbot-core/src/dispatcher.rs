use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::{
    Config,
    format::{self, format_reply},
    intent::{Intent, IntentError, IntentParser},
    model::{IncomingMessage, OutgoingMessage, WeatherError},
    provider::{WeatherProvider, provider_from_config},
    telegram::ChatTransport,
};

/// Turns one incoming chat message into exactly one reply.
///
/// Holds no per-chat state, so a single instance can serve any number of
/// messages concurrently.
#[derive(Debug, Clone)]
pub struct MessageDispatcher {
    parser: IntentParser,
    weather: Arc<dyn WeatherProvider>,
}

impl MessageDispatcher {
    pub fn new(parser: IntentParser, weather: Arc<dyn WeatherProvider>) -> Self {
        Self { parser, weather }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            IntentParser::new(config.weather.default_city.clone()),
            provider_from_config(config)?,
        ))
    }

    pub async fn handle(&self, message: IncomingMessage) -> OutgoingMessage {
        let text = match self.parser.parse(&message.text) {
            Ok(Intent::Greeting) => format::greeting().to_string(),
            Ok(Intent::Weather(query)) => {
                let result = self.weather.fetch(&query.city).await;
                match &result {
                    Ok(_) => debug!(chat_id = message.chat_id, city = %query.city, "weather lookup succeeded"),
                    Err(err @ (WeatherError::Transport(_) | WeatherError::MalformedResponse(_))) => {
                        warn!(chat_id = message.chat_id, city = %query.city, error = %err, "weather lookup failed")
                    }
                    Err(err) => debug!(chat_id = message.chat_id, city = %query.city, error = %err, "weather lookup failed"),
                }
                format_reply(&result, &query.city)
            }
            Err(IntentError::EmptyQuery) => format::empty_query().to_string(),
        };

        OutgoingMessage {
            chat_id: message.chat_id,
            text,
        }
    }

    /// Handles `message` and sends the reply through `transport`.
    ///
    /// Delivery failures are logged, not returned, so the caller can move on
    /// to the next message.
    pub async fn dispatch(&self, message: IncomingMessage, transport: &dyn ChatTransport) {
        let reply = self.handle(message).await;

        if let Err(err) = transport.send_message(&reply).await {
            error!(chat_id = reply.chat_id, error = %err, "failed to deliver reply");
        }
    }
}
