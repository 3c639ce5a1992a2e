//! Bridge from `tickbus_config::Config` to bus and logging types.
//!
//! The config crate knows nothing about the bus; all conversion happens here
//! at startup.

use tickbus_config::Config;
use tickbus_events::BusOptions;
use tickbus_telemetry::{LogConfig, LogFormat};

/// Bus options from the `[bus]` section.
#[must_use]
pub(crate) fn to_bus_options(config: &Config) -> BusOptions {
    let options = BusOptions::default().with_drain_budget(config.bus.drain_budget());
    if config.bus.warn_on_overrun {
        options
    } else {
        options.without_overrun_warnings()
    }
}

/// Log settings from the `[logging]` section. `verbose` forces `debug`.
#[must_use]
pub(crate) fn to_log_config(config: &Config, verbose: bool) -> LogConfig {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    // The section is validated on load, so the format always parses.
    let format = config
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();

    config
        .logging
        .directives
        .iter()
        .fold(LogConfig::new(level).with_format(format), |log, directive| {
            log.with_directive(directive.as_str())
        })
}
