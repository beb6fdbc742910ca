use std::{env, time::Duration};

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, FetchConfig, LoggingConfig, MonitorConfig,
    OpenAiConfig, MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES,
};
use crate::domain::Target;

const DEFAULT_PREFERENCES: &str = "Technical analyst focusing on substantive content changes";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
const MAX_FETCH_TIMEOUT_MS: u64 = 600_000;

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let targets = parse_targets(&env::var("WATCH_TARGETS").unwrap_or_default());
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let preferences = env::var("WATCH_PREFERENCES")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFERENCES.to_string());

        let interval_minutes = match env::var("WATCH_INTERVAL_MINUTES") {
            Ok(raw) => parse_interval_minutes(&raw)?,
            Err(_) => MIN_INTERVAL_MINUTES,
        };

        let noise_filter = match env::var("WATCH_NOISE_FILTER") {
            Ok(raw) => parse_flag("WATCH_NOISE_FILTER", &raw)?,
            Err(_) => true,
        };

        let monitor = MonitorConfig {
            targets,
            preferences,
            interval: Duration::from_secs(interval_minutes * 60),
            noise_filter,
        };

        let openai = OpenAiConfig {
            api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?,
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            api_url: env::var("OPENAI_API_URL").unwrap_or_else(|_| DEFAULT_OPENAI_URL.to_string()),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            reports_dir: env::var("REPORTS_DIR").unwrap_or_else(|_| "reports".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let timeout_ms = match env::var("FETCH_TIMEOUT_MS") {
            Ok(raw) => parse_timeout_ms(&raw)?,
            Err(_) => DEFAULT_FETCH_TIMEOUT_MS,
        };

        let fetch = FetchConfig {
            timeout: Duration::from_millis(timeout_ms),
            user_agent: env::var("FETCH_USER_AGENT").unwrap_or_else(|_| {
                format!(
                    "Mozilla/5.0 (compatible; page-watch/{})",
                    env!("CARGO_PKG_VERSION")
                )
            }),
        };

        let timezone = match env::var("REPORT_TIMEZONE") {
            Ok(raw) => raw.parse::<chrono_tz::Tz>().map_err(|_| ConfigError::Invalid {
                key: "REPORT_TIMEZONE",
                value: raw,
                reason: "unknown IANA timezone",
            })?,
            Err(_) => chrono_tz::UTC,
        };

        Ok(Self {
            monitor,
            openai,
            directories,
            logging,
            fetch,
            timezone,
        })
    }
}

/// Splits a newline- or comma-separated target list, keeping the given order.
pub(crate) fn parse_targets(raw: &str) -> Vec<Target> {
    raw.split(|c: char| c == '\n' || c == ',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Target::new)
        .collect()
}

pub(crate) fn parse_interval_minutes(raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason| ConfigError::Invalid {
        key: "WATCH_INTERVAL_MINUTES",
        value: raw.to_string(),
        reason,
    };
    let minutes = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| invalid("not a whole number of minutes"))?;
    if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        return Err(invalid("must be between 1 and 1440"));
    }
    Ok(minutes)
}

pub(crate) fn parse_timeout_ms(raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason| ConfigError::Invalid {
        key: "FETCH_TIMEOUT_MS",
        value: raw.to_string(),
        reason,
    };
    let millis = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| invalid("not a whole number of milliseconds"))?;
    if !(1..=MAX_FETCH_TIMEOUT_MS).contains(&millis) {
        return Err(invalid("must be between 1 and 600000"));
    }
    Ok(millis)
}

pub(crate) fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true or false",
        }),
    }
}
