//! Environment variable overrides.
//!
//! Applied after the config file layer, so a set variable always wins.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::{debug, warn};

use crate::merge::set_path;

/// Kind of TOML value a field expects.
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Integer,
    Bool,
    String,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

/// All supported `TICKBUS_*` variables.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "TICKBUS_DRAIN_BUDGET_MICROS",
        field_path: "bus.drain_budget_micros",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "TICKBUS_WARN_ON_OVERRUN",
        field_path: "bus.warn_on_overrun",
        kind: FieldKind::Bool,
    },
    EnvMapping {
        var_name: "TICKBUS_LOG_LEVEL",
        field_path: "logging.level",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "TICKBUS_LOG_FORMAT",
        field_path: "logging.format",
        kind: FieldKind::String,
    },
];

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Write every mapped variable present in `env_vars` into `merged`.
///
/// Values that cannot be coerced to the field's type are skipped with a
/// warning. Returns the number of overrides applied.
pub fn apply_env_overrides<S: BuildHasher>(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        let Some(value) = coerce(mapping.kind, raw) else {
            warn!(
                var = mapping.var_name,
                value = raw.as_str(),
                "ignoring environment override with invalid value"
            );
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying environment override"
        );
        set_path(merged, mapping.field_path, value);
        count = count.saturating_add(1);
    }

    count
}

fn coerce(kind: FieldKind, raw: &str) -> Option<toml::Value> {
    let raw = raw.trim();
    match kind {
        FieldKind::Integer => raw.parse::<i64>().ok().map(toml::Value::Integer),
        FieldKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Some(toml::Value::Boolean(false)),
            _ => None,
        },
        FieldKind::String => Some(toml::Value::String(raw.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_apply_env_overrides() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"info\"").unwrap();
        let env = make_env(&[
            ("TICKBUS_LOG_LEVEL", "debug"),
            ("TICKBUS_DRAIN_BUDGET_MICROS", "2000"),
            ("TICKBUS_WARN_ON_OVERRUN", "off"),
        ]);

        assert_eq!(apply_env_overrides(&mut merged, &env), 3);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(merged["bus"]["drain_budget_micros"].as_integer(), Some(2000));
        assert_eq!(merged["bus"]["warn_on_overrun"].as_bool(), Some(false));
    }

    #[test]
    fn test_invalid_values_are_skipped() {
        let mut merged: toml::Value = toml::from_str("[bus]\ndrain_budget_micros = 160").unwrap();
        let env = make_env(&[
            ("TICKBUS_DRAIN_BUDGET_MICROS", "soon"),
            ("TICKBUS_WARN_ON_OVERRUN", "maybe"),
        ]);

        assert_eq!(apply_env_overrides(&mut merged, &env), 0);
        assert_eq!(merged["bus"]["drain_budget_micros"].as_integer(), Some(160));
    }

    #[test]
    fn test_unrelated_vars_are_ignored() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let env = make_env(&[("TICKBUS_UNKNOWN", "1"), ("PATH", "/bin")]);
        assert_eq!(apply_env_overrides(&mut merged, &env), 0);
        assert!(merged.as_table().unwrap().is_empty());
    }
}
