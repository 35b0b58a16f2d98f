use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::WeatherSettings,
    model::{NO_DESCRIPTION, WeatherError, WeatherResult, capitalize_first},
};

use super::WeatherProvider;

/// `cod` value OpenWeather uses for a successful lookup.
const SUCCESS_CODE: &str = "200";

#[derive(Clone)]
pub struct OpenWeatherClient {
    api_key: Option<String>,
    endpoint: String,
    language: String,
    default_city: String,
    http: Client,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("endpoint", &self.endpoint)
            .field("language", &self.language)
            .field("default_city", &self.default_city)
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl OpenWeatherClient {
    pub fn new(settings: &WeatherSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key: settings
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_owned),
            endpoint: settings.endpoint.clone(),
            language: settings.language.clone(),
            default_city: settings.default_city.trim().to_string(),
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_current(&self, api_key: &str, city: &str) -> Result<WeatherResult, WeatherError> {
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", city),
                ("appid", api_key),
                ("units", "metric"),
                ("lang", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(WeatherError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Transport)?;

        if !status.is_success() {
            debug!(%status, body = %truncate_body(&body), city, "OpenWeather lookup rejected");
            return Err(WeatherError::NotFound { city: city.to_string() });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|err| {
            WeatherError::MalformedResponse(format!(
                "{err}; body: {}",
                truncate_body(&body)
            ))
        })?;

        // OpenWeather sends `cod` as a number on success and as a string on most errors.
        if !parsed.cod.as_ref().is_some_and(OwCode::is_success) {
            debug!(cod = ?parsed.cod, city, "OpenWeather reported a failed lookup");
            return Err(WeatherError::NotFound { city: city.to_string() });
        }

        Ok(parsed.into_result())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwCode {
    Number(i64),
    Text(String),
}

impl OwCode {
    fn is_success(&self) -> bool {
        match self {
            OwCode::Number(code) => code.to_string() == SUCCESS_CODE,
            OwCode::Text(code) => code.trim() == SUCCESS_CODE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    cod: Option<OwCode>,
    weather: Option<Vec<OwWeather>>,
    main: Option<OwMain>,
    wind: Option<OwWind>,
}

impl OwCurrentResponse {
    fn into_result(self) -> WeatherResult {
        let description = self
            .weather
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|w| w.description)
            .filter(|d| !d.trim().is_empty())
            .map(|d| capitalize_first(d.trim()))
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        let (temperature_c, feels_like_c, humidity_pct) = match self.main {
            Some(main) => (main.temp, main.feels_like, main.humidity),
            None => (None, None, None),
        };

        WeatherResult {
            description,
            temperature_c,
            feels_like_c,
            humidity_pct,
            wind_speed_mps: self.wind.and_then(|w| w.speed),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch(&self, city: &str) -> Result<WeatherResult, WeatherError> {
        let city = match city.trim() {
            "" => self.default_city.as_str(),
            trimmed => trimmed,
        };

        let Some(api_key) = self.api_key.as_deref() else {
            return Err(WeatherError::NotConfigured);
        };

        self.fetch_current(api_key, city).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
