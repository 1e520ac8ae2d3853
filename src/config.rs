use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a valid number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Telegram side of the process. Absent when no bot token is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct BotSettings {
    pub token: String,
    pub api_url: String,
    pub operator_chat_id: Option<i64>,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
    /// TrueType font for report text. Cyrillic needs one; missing files
    /// fall back to a built-in Latin font.
    pub report_font: PathBuf,
    pub bot: Option<BotSettings>,
}

impl Settings {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or_else(|| "data".to_string()));
        let reports_dir = var("REPORTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("reports"));
        let report_font = var("REPORT_FONT")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("fonts").join("DejaVuSans.ttf"));

        let bot = match var("BOT_TOKEN") {
            Some(token) => Some(BotSettings {
                token,
                api_url: var("TELEGRAM_API_URL")
                    .unwrap_or_else(|| "https://api.telegram.org".to_string()),
                operator_chat_id: var("OPERATOR_CHAT_ID")
                    .map(|v| parse("OPERATOR_CHAT_ID", v))
                    .transpose()?,
                poll_timeout_secs: var("POLL_TIMEOUT_SECS")
                    .map(|v| parse("POLL_TIMEOUT_SECS", v))
                    .transpose()?
                    .unwrap_or(30),
            }),
            None => None,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT")
                .map(|v| parse("PORT", v))
                .transpose()?
                .unwrap_or(8080),
            data_dir,
            reports_dir,
            report_font,
            bot,
        })
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { name, value })
}
