use crate::error::ConfigError;

/// Read an environment variable, treating unset and empty as `None`.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "value is not valid UTF-8".to_string(),
        }),
    }
}

pub(crate) fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match optional_env(key)? {
        Some(raw) => parse_bool(key, &raw),
        None => Ok(default),
    }
}

pub(crate) fn parse_u64_env(key: &str, default: u64) -> Result<u64, ConfigError> {
    match optional_env(key)? {
        Some(raw) => parse_u64(key, &raw),
        None => Ok(default),
    }
}

pub(crate) fn parse_optional_u64_env(
    key: &str,
    default: Option<u64>,
) -> Result<Option<u64>, ConfigError> {
    match optional_env(key)? {
        Some(raw) => parse_u64(key, &raw).map(Some),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a non-negative integer: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_u64};
    use crate::error::ConfigError;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("K", "TRUE").expect("bool"));
        assert!(parse_bool("K", " yes ").expect("bool"));
        assert!(!parse_bool("K", "off").expect("bool"));
    }

    #[test]
    fn parse_bool_names_the_key_on_error() {
        let err = parse_bool("SALON_ASSUME_YES", "maybe").expect_err("must reject");
        let ConfigError::InvalidValue { key, message } = err else {
            panic!("expected InvalidValue");
        };
        assert_eq!(key, "SALON_ASSUME_YES");
        assert!(message.contains("maybe"), "unexpected message: {message}");
    }

    #[test]
    fn parse_u64_rejects_negative_numbers() {
        assert_eq!(parse_u64("K", "15").expect("u64"), 15);
        assert!(parse_u64("K", "-1").is_err());
    }
}
