//! Subcommand implementations.

pub(crate) mod demo;
pub(crate) mod run;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    /// Colored, human-readable lines.
    Pretty,
    /// One JSON document.
    Json,
}
