//! Terminal styling for command reports.

use std::time::Duration;

use colored::{ColoredString, Colorize};

/// Width of the rule printed under a title.
const RULE_WIDTH: usize = 48;

/// Styling helpers for the CLI's pretty output.
pub(crate) struct Theme;

impl Theme {
    /// Command title followed by a rule.
    pub(crate) fn title(text: &str) -> String {
        format!("{}\n{}", text.bold().cyan(), Self::rule())
    }

    /// Horizontal rule.
    pub(crate) fn rule() -> ColoredString {
        "─".repeat(RULE_WIDTH).dimmed()
    }

    /// Numbered transcript entry.
    pub(crate) fn entry(index: usize, text: &str) -> String {
        if text.starts_with("--") {
            format!("     {}", text.magenta())
        } else {
            format!("{:>4} {text}", format!("{index}.").dimmed())
        }
    }

    /// Aligned statistic line.
    pub(crate) fn stat(label: &str, value: impl ToString) -> String {
        format!("  {:<18} {}", label.dimmed(), value.to_string().bold())
    }

    /// Duration in microseconds, colored red when it exceeds `budget`.
    pub(crate) fn timing(elapsed: Duration, budget: Duration) -> String {
        let text = format!("{}µs", elapsed.as_micros());
        if elapsed > budget {
            text.red().to_string()
        } else {
            text.green().to_string()
        }
    }

    /// Success line.
    pub(crate) fn ok(text: &str) -> String {
        format!("{} {text}", "✓".green())
    }

    /// Warning line.
    pub(crate) fn caution(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// De-emphasized note.
    pub(crate) fn note(text: &str) -> String {
        text.dimmed().to_string()
    }
}
