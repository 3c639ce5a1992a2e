//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Largest accepted drain budget: one second.
pub const MAX_DRAIN_BUDGET_MICROS: u64 = 1_000_000;

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Formats accepted by `logging.format`.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_bus(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_bus(config: &Config) -> ConfigResult<()> {
    let budget = config.bus.drain_budget_micros;
    if budget == 0 || budget > MAX_DRAIN_BUDGET_MICROS {
        return Err(ConfigError::Invalid {
            field: "bus.drain_budget_micros".to_owned(),
            message: format!(
                "drain budget {budget} is out of range; must be between 1 and {MAX_DRAIN_BUDGET_MICROS}"
            ),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::Invalid {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::Invalid {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }

    if let Some(empty) = config
        .logging
        .directives
        .iter()
        .position(|directive| directive.trim().is_empty())
    {
        return Err(ConfigError::Invalid {
            field: format!("logging.directives[{empty}]"),
            message: "directive must not be empty".to_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::Invalid { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let mut config = Config::default();
        config.bus.drain_budget_micros = 0;
        assert_eq!(
            field_of(validate(&config).unwrap_err()),
            "bus.drain_budget_micros"
        );
    }

    #[test]
    fn test_budget_bounds() {
        let mut config = Config::default();
        config.bus.drain_budget_micros = MAX_DRAIN_BUDGET_MICROS;
        assert!(validate(&config).is_ok());

        config.bus.drain_budget_micros = MAX_DRAIN_BUDGET_MICROS.saturating_add(1);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();
        assert_eq!(field_of(validate(&config).unwrap_err()), "logging.level");
    }

    #[test]
    fn test_invalid_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        assert_eq!(field_of(validate(&config).unwrap_err()), "logging.format");
    }

    #[test]
    fn test_empty_directive_rejected() {
        let mut config = Config::default();
        config.logging.directives = vec!["tickbus_events=trace".to_owned(), "  ".to_owned()];
        assert_eq!(
            field_of(validate(&config).unwrap_err()),
            "logging.directives[1]"
        );
    }
}
