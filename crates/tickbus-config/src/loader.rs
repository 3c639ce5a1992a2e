//! Config file loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the config file, if one was given
//! 3. Apply `TICKBUS_*` environment overrides
//! 4. Deserialize the merged tree → `Config`
//! 5. Validate

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load configuration from embedded defaults, an optional file, and the
/// process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or if the
/// merged configuration fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<Config> {
    load_with_env(path, &collect_env_vars())
}

/// [`load`] with an explicit environment snapshot.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with_env<S: BuildHasher>(
    path: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let mut merged = parse_value(DEFAULTS_TOML, "<embedded defaults>")?;

    if let Some(path) = path {
        let overlay = read_value(path)?;
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded config file");
    }

    let env_count = apply_env_overrides(&mut merged, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment overrides");
    }

    finish(merged, "<merged config>")
}

/// Load a config from a specific file path (no environment overrides).
///
/// Fields missing from the file take their default values.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let value = read_value(path)?;
    finish(value, &path.display().to_string())
}

/// Parse configuration from TOML text layered over the embedded defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the text is malformed or fails validation.
pub fn from_toml_str(content: &str) -> ConfigResult<Config> {
    let mut merged = parse_value(DEFAULTS_TOML, "<embedded defaults>")?;
    deep_merge(&mut merged, &parse_value(content, "<string>")?);
    finish(merged, "<string>")
}

fn finish(value: toml::Value, origin: &str) -> ConfigResult<Config> {
    let config: Config =
        value
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse {
                origin: origin.to_owned(),
                source: e,
            })?;
    validate::validate(&config)?;
    Ok(config)
}

fn parse_value(content: &str, origin: &str) -> ConfigResult<toml::Value> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        origin: origin.to_owned(),
        source: e,
    })
}

/// Read and parse a config file, rejecting files over the size limit.
fn read_value(path: &Path) -> ConfigResult<toml::Value> {
    let read_error = |source: std::io::Error| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    };

    let declared = std::fs::metadata(path).map_err(read_error)?.len();
    if declared > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            size: declared,
            limit: MAX_CONFIG_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(read_error)?;

    // Checked again in case the file grew between stat and read.
    let size = content.len() as u64;
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_CONFIG_FILE_SIZE,
        });
    }

    parse_value(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("tickbus.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = load_with_env(None, &no_env()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[bus]\ndrain_budget_micros = 4000\n");

        let config = load_with_env(Some(path.as_path()), &no_env()).unwrap();
        assert_eq!(config.bus.drain_budget_micros, 4000);
        assert!(config.bus.warn_on_overrun);
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[logging]\nlevel = \"warn\"\nformat = \"pretty\"\n");
        let env: HashMap<String, String> = [
            ("TICKBUS_LOG_LEVEL".to_owned(), "trace".to_owned()),
            ("TICKBUS_DRAIN_BUDGET_MICROS".to_owned(), "900".to_owned()),
        ]
        .into_iter()
        .collect();

        let config = load_with_env(Some(path.as_path()), &env).unwrap();
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.bus.drain_budget_micros, 900);
    }

    #[test]
    fn test_env_value_is_validated() {
        let env: HashMap<String, String> =
            [("TICKBUS_LOG_FORMAT".to_owned(), "yaml".to_owned())]
                .into_iter()
                .collect();
        let result = load_with_env(None, &env);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = load_with_env(Some(Path::new("/nonexistent/tickbus.toml")), &no_env());
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[bus\n");
        assert!(matches!(load_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let result = from_toml_str("[bus]\ndrain_budget_micros = \"fast\"\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_file_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[bus]\ndrain_budget_micros = 0\n");
        assert!(matches!(
            load_file(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_from_toml_str_layers_over_defaults() {
        let config = from_toml_str("[logging]\ndirectives = [\"tickbus_events=trace\"]\n").unwrap();
        assert_eq!(config.logging.directives, vec!["tickbus_events=trace"]);
        assert_eq!(config.bus.drain_budget_micros, 160);
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        let path = write_config(&dir, &data);

        let result = read_value(&path);
        assert!(
            matches!(result, Err(ConfigError::TooLarge { .. })),
            "expected TooLarge for oversized config, got: {result:?}"
        );
    }

    #[test]
    fn test_oversized_config_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.toml");
        // Not UTF-8: reading it as text would fail with a read error instead.
        std::fs::write(&path, vec![0xFF_u8; 1_100_000]).unwrap();

        match read_value(&path) {
            Err(ConfigError::TooLarge { size, limit, .. }) => {
                assert_eq!(size, 1_100_000);
                assert_eq!(limit, MAX_CONFIG_FILE_SIZE);
            },
            other => panic!("expected TooLarge, got: {other:?}"),
        }
    }
}
