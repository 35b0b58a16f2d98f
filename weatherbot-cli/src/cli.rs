use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use weatherbot_core::{Config, IncomingMessage, MessageDispatcher, TelegramClient};

use crate::{poll, webhook};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Telegram weather bot")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true, env = "WEATHERBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "weatherbot_core=debug". Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every command that answers messages.
#[derive(Debug, Args)]
pub struct BotArgs {
    /// Telegram bot token.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// OpenWeather API key.
    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    weather_api_key: Option<String>,

    /// City used when `/weather` has no argument.
    #[arg(long, env = "DEFAULT_CITY")]
    default_city: Option<String>,

    /// Language of weather descriptions, e.g. "ru" or "en".
    #[arg(long, env = "WEATHER_LANG")]
    language: Option<String>,
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Interface to bind.
    #[arg(long, env = "HOST")]
    host: Option<String>,

    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Public base URL; when set, the webhook is registered with Telegram on startup.
    #[arg(long, env = "WEBHOOK_URL")]
    public_url: Option<String>,

    /// Secret Telegram must echo in `X-Telegram-Bot-Api-Secret-Token`.
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    secret_token: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer messages by long polling Telegram.
    Poll {
        #[command(flatten)]
        bot: BotArgs,
    },

    /// Answer messages delivered to an HTTP webhook.
    Serve {
        #[command(flatten)]
        bot: BotArgs,

        #[command(flatten)]
        server: ServerArgs,
    },

    /// Print the reply the bot would send for a message, without Telegram.
    Check {
        #[command(flatten)]
        bot: BotArgs,

        /// Message text, e.g. `/weather Kyiv` or `Kyiv`.
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Interactively store credentials and the default city.
    Configure,

    /// Print the location of the config file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = self.config;

        match self.command {
            Command::Poll { bot } => {
                let cfg = bot.resolve(load_config(config_path.as_deref())?);
                let telegram = telegram_client(&cfg)?;
                let dispatcher = MessageDispatcher::from_config(&cfg)?;

                poll::run(&dispatcher, &telegram, crate::shutdown_signal()).await?;
            }
            Command::Serve { bot, server } => {
                let cfg = server.resolve(bot.resolve(load_config(config_path.as_deref())?));
                let telegram = telegram_client(&cfg)?;
                let dispatcher = MessageDispatcher::from_config(&cfg)?;

                webhook::serve(&cfg, dispatcher, telegram, crate::shutdown_signal()).await?;
            }
            Command::Check { bot, text } => {
                let cfg = bot.resolve(load_config(config_path.as_deref())?);
                let dispatcher = MessageDispatcher::from_config(&cfg)?;

                let reply = dispatcher
                    .handle(IncomingMessage {
                        chat_id: 0,
                        text: text.join(" "),
                    })
                    .await;
                println!("{}", reply.text);
            }
            Command::Configure => configure(config_path.as_deref())?,
            Command::ConfigPath => println!("{}", config_file(config_path.as_deref())?.display()),
        }

        Ok(())
    }
}

impl BotArgs {
    /// Applies flags and environment values on top of the file config.
    fn resolve(self, mut cfg: Config) -> Config {
        if let Some(token) = self.bot_token {
            cfg.telegram.bot_token = Some(token);
        }
        if let Some(key) = self.weather_api_key {
            cfg.weather.api_key = Some(key);
        }
        if let Some(city) = self.default_city {
            cfg.weather.default_city = city;
        }
        if let Some(language) = self.language {
            cfg.weather.language = language;
        }
        cfg
    }
}

impl ServerArgs {
    fn resolve(self, mut cfg: Config) -> Config {
        if let Some(host) = self.host {
            cfg.server.host = host;
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(url) = self.public_url {
            cfg.server.public_url = Some(url);
        }
        if let Some(secret) = self.secret_token {
            cfg.server.secret_token = Some(secret);
        }
        cfg
    }
}

fn config_file(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_file_path(),
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    Config::load_from(&config_file(explicit)?)
}

fn telegram_client(cfg: &Config) -> anyhow::Result<TelegramClient> {
    let token = cfg.require_bot_token()?;
    TelegramClient::new(token, &cfg.telegram).context("Failed to create Telegram client")
}

fn configure(explicit: Option<&Path>) -> anyhow::Result<()> {
    let path = config_file(explicit)?;
    let mut cfg = Config::load_from(&path)?;

    let token = Password::new("Telegram bot token:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current value")
        .prompt()
        .context("Failed to read bot token")?;
    if !token.trim().is_empty() {
        cfg.telegram.bot_token = Some(token.trim().to_string());
    }

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current value")
        .prompt()
        .context("Failed to read OpenWeather API key")?;
    if !api_key.trim().is_empty() {
        cfg.weather.api_key = Some(api_key.trim().to_string());
    }

    let city = Text::new("Default city:")
        .with_default(&cfg.weather.default_city)
        .prompt()
        .context("Failed to read default city")?;
    if !city.trim().is_empty() {
        cfg.weather.default_city = city.trim().to_string();
    }

    cfg.save_to(&path)?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
