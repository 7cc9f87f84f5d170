//! Rule source resolution.
//!
//! Resolution order, first hit wins:
//! 1. An explicit path (`--rules` flag or `LT_RULES`, both surfaced by the CLI)
//! 2. `<config dir>/log_triage/rules.json`, when the file exists
//! 3. The built-in reference table

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::rules::RuleTable;
use crate::validate::ConfigError;

/// Application directory under the user's config dir.
pub const APP_DIR: &str = "log_triage";

/// File name of the user rules file.
pub const RULES_FILE_NAME: &str = "rules.json";

/// Candidate locations for the rule table.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicitly requested rules file. Must exist if set.
    pub rules: Option<PathBuf>,
    /// Directory holding user configuration.
    pub config_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Paths for the current user, with an optional explicit override.
    pub fn for_user(rules: Option<PathBuf>) -> Self {
        Self {
            rules,
            config_dir: dirs::config_dir().map(|d| d.join(APP_DIR)),
        }
    }

    /// Location of the per-user rules file, existing or not.
    pub fn user_rules_path(&self) -> Option<PathBuf> {
        self.config_dir.as_ref().map(|d| d.join(RULES_FILE_NAME))
    }
}

/// Where the active rule table came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum RulesSource {
    Explicit(PathBuf),
    UserConfig(PathBuf),
    Builtin,
}

impl RulesSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            RulesSource::Explicit(p) | RulesSource::UserConfig(p) => Some(p),
            RulesSource::Builtin => None,
        }
    }
}

impl fmt::Display for RulesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesSource::Explicit(p) => write!(f, "{}", p.display()),
            RulesSource::UserConfig(p) => write!(f, "{} (user config)", p.display()),
            RulesSource::Builtin => write!(f, "built-in"),
        }
    }
}

/// Decide which rule source applies without loading it.
pub fn resolve_source(paths: &ConfigPaths) -> RulesSource {
    if let Some(path) = &paths.rules {
        return RulesSource::Explicit(path.clone());
    }
    if let Some(path) = paths.user_rules_path() {
        if path.is_file() {
            return RulesSource::UserConfig(path);
        }
        debug!(path = %path.display(), "no user rules file");
    }
    RulesSource::Builtin
}

/// Resolve and load the rule table.
pub fn load_rule_table(paths: &ConfigPaths) -> Result<(RuleTable, RulesSource), ConfigError> {
    let source = resolve_source(paths);
    let table = match source.path() {
        Some(path) => RuleTable::load(path)?,
        None => RuleTable::builtin()?,
    };
    debug!(source = %source, rules = table.len(), "rule table resolved");
    Ok((table, source))
}
