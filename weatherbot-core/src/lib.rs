//! Core library for the `weatherbot` Telegram bot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider seam and its OpenWeather implementation
//! - Intent parsing, reply formatting and the per-message dispatcher
//! - A small Telegram Bot API client used as the chat transport
//!
//! It is used by `weatherbot-cli`, which owns the polling and webhook delivery loops.

pub mod config;
pub mod dispatcher;
pub mod format;
pub mod intent;
pub mod model;
pub mod provider;
pub mod telegram;

pub use config::{Config, ServerSettings, TelegramSettings, WeatherSettings};
pub use dispatcher::MessageDispatcher;
pub use intent::{Intent, IntentError, IntentParser};
pub use model::{
    ChatId, IncomingMessage, OutgoingMessage, WeatherError, WeatherQuery, WeatherResult,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherClient};
pub use telegram::{ChatTransport, TelegramClient, TelegramError, Update};
