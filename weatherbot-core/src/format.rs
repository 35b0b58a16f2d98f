//! User-facing reply texts.
//!
//! Every numeric value is rounded to the nearest whole unit; missing values
//! are rendered as [`NO_DATA`].

use crate::model::{WeatherError, WeatherResult};

/// Substituted for any value the provider did not report.
pub const NO_DATA: &str = "нет данных";

const GREETING: &str = "Привет! Я бот, который показывает текущую погоду.\n\
                        Примеры:\n\
                        /weather Одесса\n\
                        или просто отправьте название города, например: Кишинев";

const EMPTY_QUERY: &str = "Отправьте название города, например: Одесса";

/// Reply for `/start`, `/help` and unknown commands.
pub fn greeting() -> &'static str {
    GREETING
}

/// Reply for a message that names no city.
pub fn empty_query() -> &'static str {
    EMPTY_QUERY
}

/// Turns a lookup outcome into the reply text for `city`.
pub fn format_reply(result: &Result<WeatherResult, WeatherError>, city: &str) -> String {
    match result {
        Ok(weather) => format_weather(weather, city),
        Err(err) => format_error(err),
    }
}

pub fn format_error(err: &WeatherError) -> String {
    match err {
        WeatherError::NotConfigured => {
            "Не настроен WEATHER_API_KEY. Добавьте его в .env и перезапустите бота.".to_string()
        }
        WeatherError::NotFound { city } => {
            format!("Не удалось найти погоду для города \"{city}\". Проверьте название.")
        }
        WeatherError::Transport(_) => {
            "Не удалось связаться с OpenWeather. Попробуйте позже.".to_string()
        }
        WeatherError::MalformedResponse(_) => {
            "OpenWeather вернул непонятный ответ. Попробуйте позже.".to_string()
        }
    }
}

fn format_weather(weather: &WeatherResult, city: &str) -> String {
    format!(
        "☀️ Погода в {city} сейчас:\n\
         {description}\n\
         \n\
         🌡 Температура: {temp}\n\
         🤔 Ощущается как: {feels}\n\
         💧 Влажность: {humidity}\n\
         🌬 Ветер: {wind}",
        description = weather.description,
        temp = with_unit(weather.temperature_c, "°C"),
        feels = with_unit(weather.feels_like_c, "°C"),
        humidity = with_unit(weather.humidity_pct.map(f64::from), "%"),
        wind = with_unit(weather.wind_speed_mps, " м/с"),
    )
}

fn with_unit(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{unit}", round_whole(v)),
        None => NO_DATA.to_string(),
    }
}

/// Rounds half away from zero; `-0.4` becomes `0`, not `-0`.
fn round_whole(value: f64) -> i64 {
    value.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeatherResult {
        WeatherResult {
            description: "Ясно".into(),
            temperature_c: Some(21.4),
            feels_like_c: Some(20.9),
            humidity_pct: Some(63),
            wind_speed_mps: Some(3.6),
        }
    }

    #[test]
    fn success_reply_contains_all_fields() {
        let text = format_reply(&Ok(sample()), "Одесса");

        assert!(text.contains("Погода в Одесса"));
        assert!(text.contains("Ясно"));
        assert!(text.contains("Температура: 21°C"));
        assert!(text.contains("Ощущается как: 21°C"));
        assert!(text.contains("Влажность: 63%"));
        assert!(text.contains("Ветер: 4 м/с"));
    }

    #[test]
    fn missing_values_render_sentinel() {
        let weather = WeatherResult {
            description: "Ясно".into(),
            temperature_c: None,
            feels_like_c: None,
            humidity_pct: None,
            wind_speed_mps: None,
        };
        let text = format_reply(&Ok(weather), "Kyiv");

        assert!(text.contains(&format!("Температура: {NO_DATA}")));
        assert!(text.contains(&format!("Ощущается как: {NO_DATA}")));
        assert!(text.contains(&format!("Влажность: {NO_DATA}")));
        assert!(text.contains(&format!("Ветер: {NO_DATA}")));
    }

    #[test]
    fn negative_values_round_without_negative_zero() {
        assert_eq!(round_whole(-0.4), 0);
        assert_eq!(round_whole(-2.5), -3);
        assert_eq!(round_whole(2.5), 3);
        assert_eq!(with_unit(Some(-0.2), "°C"), "0°C");
    }

    #[test]
    fn error_replies_are_distinct() {
        let not_configured = format_error(&WeatherError::NotConfigured);
        let not_found = format_error(&WeatherError::NotFound { city: "Atlantis".into() });
        let malformed = format_error(&WeatherError::MalformedResponse("eof".into()));

        assert!(not_configured.contains("WEATHER_API_KEY"));
        assert!(not_found.contains("\"Atlantis\""));
        assert!(not_found.contains("Проверьте название"));
        assert!(malformed.contains("Попробуйте позже"));
        assert_ne!(not_configured, malformed);
    }

    #[test]
    fn error_reply_ignores_requested_city_spelling() {
        let err = WeatherError::NotFound { city: "Odessa".into() };
        let text = format_reply(&Err(err), "");

        assert!(text.contains("\"Odessa\""));
    }
}
