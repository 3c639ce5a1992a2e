//! Configuration types for the tickbus host.
//!
//! These types do not depend on `tickbus-events`; the host converts them to
//! bus options at startup. Every struct implements [`Default`] with the same
//! values as the embedded `defaults.toml`, so a bare `[section]` header still
//! yields a working configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event bus tuning.
    pub bus: BusSection,
    /// Log level, format, and per-target directives.
    pub logging: LoggingSection,
}

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSection {
    /// Time budget for draining deferred deliveries once per tick, in
    /// microseconds.
    pub drain_budget_micros: u64,
    /// Log a warning when a drain runs past twice its budget.
    pub warn_on_overrun: bool,
}

impl Default for BusSection {
    fn default() -> Self {
        Self {
            drain_budget_micros: 160,
            warn_on_overrun: true,
        }
    }
}

impl BusSection {
    /// The drain budget as a [`Duration`].
    #[must_use]
    pub fn drain_budget(&self) -> Duration {
        Duration::from_micros(self.drain_budget_micros)
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, or `"json"`.
    pub format: String,
    /// Per-target tracing directives (e.g. `["tickbus_events=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_sections_use_defaults() {
        let config: Config = toml::from_str("[bus]\n[logging]\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str("[bus]\nwarn_on_overrun = false\n").unwrap();
        assert_eq!(config.bus.drain_budget_micros, 160);
        assert!(!config.bus.warn_on_overrun);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_drain_budget_duration() {
        let section = BusSection {
            drain_budget_micros: 2_500,
            ..BusSection::default()
        };
        assert_eq!(section.drain_budget(), Duration::from_micros(2_500));
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["bus"]["drain_budget_micros"], 160);
        assert_eq!(json["logging"]["format"], "compact");
    }
}
