//! Log Triage core: signature classification of log lines and reporting.
//!
//! The classifier is a pure function of its input text, a category
//! selection, and a [`RuleTable`](lt_config::RuleTable). Reporting turns the
//! resulting records into tables, CSV, JSON, and per-category counts.

pub mod classify;
pub mod cli;
pub mod exit_codes;
pub mod logging;
pub mod report;

pub use classify::{
    classify, split_lines, ActiveCategorySelection, ClassificationRecord, Classifier, LogLines,
};
pub use exit_codes::ExitCode;
pub use report::{summarize, AnalysisReport, CategoryCount};
