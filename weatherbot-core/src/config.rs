use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CITY: &str = "Odessa";
pub const DEFAULT_LANGUAGE: &str = "ru";
pub const DEFAULT_WEATHER_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Chat transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    pub api_base: String,
    /// Long-poll timeout passed to `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: DEFAULT_TELEGRAM_API.to_string(),
            poll_timeout_secs: 30,
        }
    }
}

/// Weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub api_key: Option<String>,
    /// City used for `/weather` without an argument and for empty lookups.
    pub default_city: String,
    /// Value of the provider's `lang` parameter.
    pub language: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: DEFAULT_CITY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            endpoint: DEFAULT_WEATHER_ENDPOINT.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Webhook server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub webhook_path: String,
    /// Public base URL registered with Telegram via `setWebhook`.
    pub public_url: Option<String>,
    /// Expected value of the `X-Telegram-Bot-Api-Secret-Token` header.
    pub secret_token: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            webhook_path: "/webhook".to_string(),
            public_url: None,
            secret_token: None,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [telegram]
/// bot_token = "..."
///
/// [weather]
/// api_key = "..."
/// default_city = "Odessa"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramSettings,
    pub weather: WeatherSettings,
    pub server: ServerSettings,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherbot", "weatherbot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Bot token, required by both delivery modes.
    pub fn require_bot_token(&self) -> Result<&str> {
        non_empty(self.telegram.bot_token.as_deref()).ok_or_else(|| {
            anyhow!(
                "No Telegram bot token configured.\n\
                 Hint: set BOT_TOKEN in the environment or .env, or run `weatherbot configure`."
            )
        })
    }

    /// Returns the weather API key, if present and not blank.
    pub fn weather_api_key(&self) -> Option<&str> {
        non_empty(self.weather.api_key.as_deref())
    }

    pub fn is_weather_configured(&self) -> bool {
        self.weather_api_key().is_some()
    }

    /// Full URL Telegram should deliver updates to, when a public URL is set.
    pub fn webhook_url(&self) -> Option<String> {
        let base = non_empty(self.server.public_url.as_deref())?;
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.server.webhook_path.trim_start_matches('/')
        ))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_builtin_values() {
        let cfg = Config::default();

        assert_eq!(cfg.weather.default_city, "Odessa");
        assert_eq!(cfg.weather.language, "ru");
        assert_eq!(cfg.weather.timeout_secs, 10);
        assert_eq!(cfg.server.port, 5000);
        assert!(!cfg.is_weather_configured());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let cfg: Config = toml::from_str(
            r#"
            [weather]
            api_key = "KEY"
            default_city = "Kyiv"
            "#,
        )
        .expect("partial config must parse");

        assert_eq!(cfg.weather_api_key(), Some("KEY"));
        assert_eq!(cfg.weather.default_city, "Kyiv");
        assert_eq!(cfg.weather.endpoint, DEFAULT_WEATHER_ENDPOINT);
        assert_eq!(cfg.telegram.api_base, DEFAULT_TELEGRAM_API);
        assert!(cfg.telegram.bot_token.is_none());
    }

    #[test]
    fn require_bot_token_errors_when_missing_or_blank() {
        let mut cfg = Config::default();
        let err = cfg.require_bot_token().unwrap_err();
        assert!(err.to_string().contains("No Telegram bot token configured"));

        cfg.telegram.bot_token = Some("   ".into());
        assert!(cfg.require_bot_token().is_err());

        cfg.telegram.bot_token = Some("123:abc".into());
        assert_eq!(cfg.require_bot_token().unwrap(), "123:abc");
    }

    #[test]
    fn blank_api_key_counts_as_not_configured() {
        let mut cfg = Config::default();
        cfg.weather.api_key = Some(String::new());

        assert_eq!(cfg.weather_api_key(), None);
        assert!(!cfg.is_weather_configured());
    }

    #[test]
    fn webhook_url_joins_base_and_path() {
        let mut cfg = Config::default();
        assert_eq!(cfg.webhook_url(), None);

        cfg.server.public_url = Some("https://bot.example.com/".into());
        assert_eq!(cfg.webhook_url().as_deref(), Some("https://bot.example.com/webhook"));
    }

    #[test]
    fn load_from_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert!(cfg.telegram.bot_token.is_none());
        assert_eq!(cfg.weather.default_city, DEFAULT_CITY);
    }

    #[test]
    fn save_to_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.weather.default_city = "Lviv".into();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.weather.default_city, "Lviv");
    }
}
