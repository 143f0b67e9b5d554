//! Typed runtime configuration.
//!
//! Resolved from [`Settings`] with `SALON_*` environment overrides.

mod helpers;

use std::time::Duration;

use chrono::FixedOffset;
use url::Url;

use crate::config::helpers::{optional_env, parse_bool_env, parse_optional_u64_env, parse_u64_env};
use crate::error::ConfigError;
use crate::settings::Settings;

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root; endpoints such as `/clientes` are appended to its path.
    pub base_url: Url,
    pub timeout: Option<Duration>,
}

/// Transient notification settings.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub ttl: Duration,
}

/// Local presentation settings.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub utc_offset: FixedOffset,
    pub assume_yes: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub notifications: NotificationConfig,
    pub display: DisplayConfig,
}

impl Config {
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let base_url = match optional_env("SALON_API_URL")? {
            Some(raw) => validate_base_url("SALON_API_URL", &raw)?,
            None => validate_base_url("api.base_url", &settings.api.base_url)?,
        };
        let timeout = parse_optional_u64_env("SALON_HTTP_TIMEOUT_SECS", settings.api.timeout_secs)?
            .map(Duration::from_secs);
        let ttl_secs =
            parse_u64_env("SALON_NOTIFICATION_TTL_SECS", settings.notifications.ttl_secs)?;
        let utc_offset = match optional_env("SALON_UTC_OFFSET")? {
            Some(raw) => parse_utc_offset("SALON_UTC_OFFSET", &raw)?,
            None => parse_utc_offset("display.utc_offset", &settings.display.utc_offset)?,
        };

        Ok(Self {
            api: ApiConfig { base_url, timeout },
            notifications: NotificationConfig {
                ttl: Duration::from_secs(ttl_secs),
            },
            display: DisplayConfig {
                utc_offset,
                assume_yes: parse_bool_env("SALON_ASSUME_YES", settings.display.assume_yes)?,
            },
        })
    }
}

/// `key` names where `raw` came from: the env var or the settings entry.
fn validate_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("invalid URL '{trimmed}': {e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "API root must not carry a query or fragment".to_string(),
        });
    }

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
    Ok(url)
}

/// Parse `+HH:MM` / `-HH:MM` (or `Z`) into a fixed offset.
fn parse_utc_offset(key: &str, raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };

    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| invalid("zero offset".to_string()));
    }

    let (sign, rest) = match trimmed.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid(format!("expected +HH:MM or -HH:MM, got '{trimmed}'"))),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| invalid(format!("expected +HH:MM or -HH:MM, got '{trimmed}'")))?;
    let hours: i32 = hours
        .parse()
        .map_err(|_| invalid(format!("invalid hours in '{trimmed}'")))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| invalid(format!("invalid minutes in '{trimmed}'")))?;
    if hours > 14 || minutes > 59 {
        return Err(invalid(format!("offset '{trimmed}' out of range")));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| invalid(format!("offset '{trimmed}' out of range")))
}
