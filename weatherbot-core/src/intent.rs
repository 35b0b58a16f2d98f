//! Extracts what the user asked for from raw chat text.

use crate::model::WeatherQuery;

const WEATHER_COMMAND: &str = "weather";
const GREETING_COMMANDS: &[&str] = &["start", "help"];

/// What an incoming message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// `/start`, `/help` or any command the bot does not know.
    Greeting,
    Weather(WeatherQuery),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    #[error("message does not name a city")]
    EmptyQuery,
}

/// A `/command` split into its lower-cased name and the raw argument text.
#[derive(Debug, PartialEq, Eq)]
struct Command<'a> {
    name: String,
    args: &'a str,
}

impl<'a> Command<'a> {
    /// Returns `None` for plain text. Bot mentions (`/weather@MyBot`) are dropped.
    fn parse(text: &'a str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('/')?;
        let (head, args) = rest
            .split_once(char::is_whitespace)
            .unwrap_or((rest, ""));

        let name = head.split('@').next().unwrap_or_default().to_lowercase();
        if name.is_empty() {
            return None;
        }

        Some(Self { name, args })
    }

    fn is_weather(&self) -> bool {
        self.name == WEATHER_COMMAND
    }
}

#[derive(Debug, Clone)]
pub struct IntentParser {
    default_city: String,
}

impl IntentParser {
    pub fn new(default_city: impl Into<String>) -> Self {
        Self { default_city: normalize(&default_city.into()) }
    }

    pub fn parse(&self, raw_text: &str) -> Result<Intent, IntentError> {
        match Command::parse(raw_text) {
            Some(command) if command.is_weather() => {
                self.parse_city(raw_text, Some(command.args)).map(Intent::Weather)
            }
            Some(command) => {
                if !GREETING_COMMANDS.contains(&command.name.as_str()) {
                    tracing::debug!(command = %command.name, "unknown command, answering with help");
                }
                Ok(Intent::Greeting)
            }
            None => self.parse_city(raw_text, None).map(Intent::Weather),
        }
    }

    /// Resolves the city a message refers to.
    ///
    /// For a `/weather` command the argument is used; `explicit_argument`, when
    /// given, takes the place of the text after the command (transports that
    /// pre-split command arguments pass them here). A bare `/weather` means the
    /// default city. Plain text is taken as the city name in full.
    pub fn parse_city(
        &self,
        raw_text: &str,
        explicit_argument: Option<&str>,
    ) -> Result<WeatherQuery, IntentError> {
        let city = match Command::parse(raw_text).filter(Command::is_weather) {
            Some(command) => {
                let argument = normalize(explicit_argument.unwrap_or(command.args));
                if argument.is_empty() { self.default_city.clone() } else { argument }
            }
            None => normalize(raw_text),
        };

        if city.is_empty() {
            return Err(IntentError::EmptyQuery);
        }

        Ok(WeatherQuery { city })
    }
}

/// Trims and collapses inner runs of whitespace to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
