//! Environment variable names and helpers for wiring the Telegram sink
//! into a service.
//!
//! These are purely helpers; [`crate::telegram::TelegramHandler`] itself
//! never reads the environment.

use crate::telegram::TelegramConfig;
use std::time::Duration;

/// Bot token issued by BotFather. Required.
pub const TELEGRAM_LOG_TOKEN_ENV: &str = "TELEGRAM_LOG_TOKEN";

/// Target chat id or `@channelusername`. Required.
pub const TELEGRAM_LOG_CHANNEL_ENV: &str = "TELEGRAM_LOG_CHANNEL";

/// Timezone of the date line, e.g. `Europe/Berlin`.
pub const TELEGRAM_LOG_TIMEZONE_ENV: &str = "TELEGRAM_LOG_TIMEZONE";

/// PHP-style date pattern, e.g. `Y-m-d H:i:s`.
pub const TELEGRAM_LOG_DATE_FORMAT_ENV: &str = "TELEGRAM_LOG_DATE_FORMAT";

/// Bot API base URL, for self-hosted Bot API servers.
pub const TELEGRAM_LOG_API_BASE_ENV: &str = "TELEGRAM_LOG_API_BASE";

/// Request timeout in whole seconds.
pub const TELEGRAM_LOG_TIMEOUT_SECS_ENV: &str = "TELEGRAM_LOG_TIMEOUT_SECS";

/// Set to `1` or `true` to skip TLS certificate verification.
pub const TELEGRAM_LOG_INSECURE_TLS_ENV: &str = "TELEGRAM_LOG_INSECURE_TLS";

/// Error returned when the environment does not describe a usable config.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EnvError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Build a [`TelegramConfig`] from the process environment.
pub fn config_from_env() -> Result<TelegramConfig, EnvError> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Build a [`TelegramConfig`] from an arbitrary key lookup.
///
/// Unset optional keys keep the [`TelegramConfig::new`] defaults.
pub fn config_from_lookup<F>(lookup: F) -> Result<TelegramConfig, EnvError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |name: &'static str| {
        lookup(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or(EnvError::Missing(name))
    };

    let mut config = TelegramConfig::new(required(TELEGRAM_LOG_TOKEN_ENV)?, required(TELEGRAM_LOG_CHANNEL_ENV)?);

    if let Some(timezone) = lookup(TELEGRAM_LOG_TIMEZONE_ENV) {
        config.timezone = timezone;
    }
    if let Some(date_format) = lookup(TELEGRAM_LOG_DATE_FORMAT_ENV) {
        config.date_format = date_format;
    }
    if let Some(api_base) = lookup(TELEGRAM_LOG_API_BASE_ENV) {
        config.api_base = api_base;
    }
    if let Some(raw) = lookup(TELEGRAM_LOG_TIMEOUT_SECS_ENV) {
        let secs = raw.trim().parse::<u64>().map_err(|_| EnvError::Invalid {
            name: TELEGRAM_LOG_TIMEOUT_SECS_ENV,
            value: raw.clone(),
        })?;
        config.transport.timeout = Duration::from_secs(secs);
    }
    if let Some(raw) = lookup(TELEGRAM_LOG_INSECURE_TLS_ENV) {
        config.transport.verify_tls = !matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }

    Ok(config)
}
