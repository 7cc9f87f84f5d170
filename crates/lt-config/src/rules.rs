//! Signature rule types and the immutable rule table.
//!
//! A [`RuleTable`] is an ordered list of [`Rule`]s plus the grouping of
//! signatures by category. Declaration order is significant: when a line
//! contains several signatures, the rule declared first wins.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

use crate::validate::{self, ConfigError};
use crate::RULES_SCHEMA_VERSION;

/// Category reported for lines that match no signature.
///
/// Output-only; a rules file may not declare it.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Remediation reported for lines that match no signature.
pub const UNKNOWN_REMEDIATION: &str = "No known fix. Manual check required.";

/// A single signature rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Literal substring searched for in each log line.
    pub signature: String,
    /// Category the rule reports; must be declared in a grouping.
    pub category: String,
    /// Suggested fix shown to the operator.
    pub remediation: String,
}

impl Rule {
    pub fn new(
        signature: impl Into<String>,
        category: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            signature: signature.into(),
            category: category.into(),
            remediation: remediation.into(),
        }
    }

    /// Whether `line` contains this rule's signature.
    pub fn matches(&self, line: &str) -> bool {
        line.contains(self.signature.as_str())
    }
}

/// A category and the signatures it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    /// Name used for filtering and reporting.
    pub name: String,
    /// Signatures whose rules report this category.
    pub signatures: Vec<String>,
}

impl CategoryGroup {
    pub fn new(name: impl Into<String>, signatures: &[&str]) -> Self {
        Self {
            name: name.into(),
            signatures: signatures.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// On-disk rules file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesFile {
    pub schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub categories: Vec<CategoryGroup>,

    pub rules: Vec<Rule>,
}

impl Default for RulesFile {
    /// The reference rule set for z/OS job output.
    fn default() -> Self {
        Self {
            schema_version: RULES_SCHEMA_VERSION.to_string(),
            description: Some("Built-in mainframe SYSOUT/ABEND signatures".to_string()),
            categories: vec![
                CategoryGroup::new("JCL", &["IEC141I", "IEB3270E"]),
                CategoryGroup::new("COBOL", &["S0C7", "S0C4"]),
                CategoryGroup::new("DB2", &["SQLCODE = -911"]),
                CategoryGroup::new("SMS/Storage", &["IGD17272I", "IGD104I"]),
            ],
            rules: vec![
                Rule::new(
                    "S0C7",
                    "COBOL",
                    "Data exception — check numeric fields or uninitialized variables.",
                ),
                Rule::new(
                    "S0C4",
                    "COBOL",
                    "Protection exception — check array bounds, null pointer.",
                ),
                Rule::new(
                    "SQLCODE = -911",
                    "DB2",
                    "Deadlock or timeout — check concurrent access.",
                ),
                Rule::new(
                    "IGD17272I",
                    "SMS/Storage",
                    "Dataset not found — check DISP or deletion.",
                ),
                Rule::new(
                    "IGD104I",
                    "SMS/Storage",
                    "Unallocated DDNAME — ensure it exists in JCL.",
                ),
                Rule::new("IEC141I", "JCL", "Open error — check file DISP or unit."),
                Rule::new(
                    "IEB3270E",
                    "JCL",
                    "PDS member missing — verify member name or allocation.",
                ),
            ],
        }
    }
}

/// Validated, read-only signature table.
///
/// Only constructible through [`RuleTable::new`], which runs the full
/// consistency check, so every table in circulation is well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    file: RulesFile,
}

impl RuleTable {
    /// Validate a rules file and wrap it as a table.
    pub fn new(file: RulesFile) -> Result<Self, ConfigError> {
        validate::check(&file)?;
        debug!(
            rules = file.rules.len(),
            categories = file.categories.len(),
            "rule table validated"
        );
        Ok(Self { file })
    }

    /// The embedded reference table.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(RulesFile::default())
    }

    /// Parse and validate a JSON rules document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: RulesFile = serde_json::from_str(json)?;
        Self::new(file)
    }

    /// Read, parse and validate a rules file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&content)?;
        info!(path = %path.display(), rules = table.len(), "loaded rules file");
        Ok(table)
    }

    /// All rules in declaration order. The order decides match precedence.
    pub fn lookup_all(&self) -> &[Rule] {
        &self.file.rules
    }

    /// Rule for an exact signature.
    pub fn lookup(&self, signature: &str) -> Option<&Rule> {
        self.file.rules.iter().find(|r| r.signature == signature)
    }

    /// Signatures grouped under `category`.
    pub fn signatures_for(&self, category: &str) -> Result<&[String], ConfigError> {
        self.file
            .categories
            .iter()
            .find(|g| g.name == category)
            .map(|g| g.signatures.as_slice())
            .ok_or_else(|| ConfigError::UnknownCategory(category.to_string()))
    }

    /// Declared category names in declaration order.
    pub fn all_categories(&self) -> Vec<&str> {
        self.file.categories.iter().map(|g| g.name.as_str()).collect()
    }

    /// Category groupings in declaration order.
    pub fn category_groups(&self) -> &[CategoryGroup] {
        &self.file.categories
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.file.categories.iter().any(|g| g.name == category)
    }

    /// First rule, in declaration order, whose signature occurs in `line`.
    ///
    /// Neither the position of the match in the line nor its length matters.
    pub fn find_match(&self, line: &str) -> Option<&Rule> {
        self.file.rules.iter().find(|r| r.matches(line))
    }

    pub fn description(&self) -> Option<&str> {
        self.file.description.as_deref()
    }

    pub fn len(&self) -> usize {
        self.file.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.rules.is_empty()
    }

    /// SHA-256 of the canonical JSON form, hex encoded.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(&self.file)?;
        Ok(hex::encode(Sha256::digest(json.as_bytes())))
    }
}
