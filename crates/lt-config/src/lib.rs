//! Log Triage rule table loading and validation.
//!
//! This crate provides:
//! - The ordered, immutable [`RuleTable`] of error signatures
//! - The embedded reference rule set for mainframe job logs
//! - Consistency validation of category groupings against rules
//! - Rule source resolution (CLI → env → XDG → built-in)

pub mod resolve;
pub mod rules;
pub mod validate;

pub use resolve::{load_rule_table, resolve_source, ConfigPaths, RulesSource};
pub use rules::{
    CategoryGroup, Rule, RuleTable, RulesFile, UNKNOWN_CATEGORY, UNKNOWN_REMEDIATION,
};
pub use validate::ConfigError;

/// Schema version for rules files.
pub const RULES_SCHEMA_VERSION: &str = lt_common::SCHEMA_VERSION;
