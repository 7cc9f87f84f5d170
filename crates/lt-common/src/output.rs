//! Output format selection shared by the CLI and report renderers.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering format for classification reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Aligned columns for a terminal.
    #[default]
    Table,
    /// Machine-readable JSON envelope.
    Json,
    /// `Log,Category,Fix` rows with a header.
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_table() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn display_matches_serde_names() {
        for format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Csv] {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format));
        }
    }
}
