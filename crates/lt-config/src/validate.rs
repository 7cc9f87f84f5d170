//! Rule table consistency checks.
//!
//! Every rule must belong to exactly one declared category grouping, and every
//! grouped signature must name a rule of that category. A mismatch is a
//! configuration defect and is reported before any line is classified.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::rules::{RulesFile, UNKNOWN_CATEGORY};

/// Errors in the rule table or in a category selection made against it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read rules file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported rules schema version: {found} (supported: {supported})")]
    UnsupportedVersion { found: String, supported: String },

    #[error("rule table has no rules")]
    EmptyTable,

    #[error("rule #{index} has an empty signature")]
    EmptySignature { index: usize },

    #[error("duplicate signature '{0}'")]
    DuplicateSignature(String),

    #[error("category name must not be empty")]
    EmptyCategoryName,

    #[error("category '{0}' is reserved for unmatched lines")]
    ReservedCategory(String),

    #[error("duplicate category '{0}'")]
    DuplicateCategory(String),

    #[error("category '{0}' has no signatures")]
    EmptyCategory(String),

    #[error("rule '{signature}' references undefined category '{category}'")]
    UndefinedCategory { signature: String, category: String },

    #[error("category '{category}' lists signature '{signature}' which has no rule")]
    UndefinedSignature { category: String, signature: String },

    #[error("signature '{signature}' is grouped under '{grouped}' but its rule is '{declared}'")]
    CategoryMismatch {
        signature: String,
        grouped: String,
        declared: String,
    },

    #[error("signature '{0}' appears in more than one category grouping")]
    MultiplyGrouped(String),

    #[error("signature '{0}' is not listed in any category grouping")]
    Ungrouped(String),

    #[error("unrecognized category '{0}'")]
    UnknownCategory(String),
}

impl From<ConfigError> for lt_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Json(_) => lt_common::Error::InvalidRules(err.to_string()),
            ConfigError::UnsupportedVersion { .. } => {
                lt_common::Error::SchemaValidation(err.to_string())
            }
            other => lt_common::Error::Config(other.to_string()),
        }
    }
}

/// Run every consistency check against a rules document.
pub fn check(file: &RulesFile) -> Result<(), ConfigError> {
    if !lt_common::schema::is_compatible(&file.schema_version) {
        return Err(ConfigError::UnsupportedVersion {
            found: file.schema_version.clone(),
            supported: lt_common::SCHEMA_VERSION.to_string(),
        });
    }
    if file.rules.is_empty() {
        return Err(ConfigError::EmptyTable);
    }

    let mut category_names = HashSet::new();
    for group in &file.categories {
        if group.name.is_empty() {
            return Err(ConfigError::EmptyCategoryName);
        }
        if group.name == UNKNOWN_CATEGORY {
            return Err(ConfigError::ReservedCategory(group.name.clone()));
        }
        if !category_names.insert(group.name.as_str()) {
            return Err(ConfigError::DuplicateCategory(group.name.clone()));
        }
        if group.signatures.is_empty() {
            return Err(ConfigError::EmptyCategory(group.name.clone()));
        }
    }

    let mut signatures = HashSet::new();
    for (index, rule) in file.rules.iter().enumerate() {
        if rule.signature.is_empty() {
            return Err(ConfigError::EmptySignature { index });
        }
        if !signatures.insert(rule.signature.as_str()) {
            return Err(ConfigError::DuplicateSignature(rule.signature.clone()));
        }
        if !category_names.contains(rule.category.as_str()) {
            return Err(ConfigError::UndefinedCategory {
                signature: rule.signature.clone(),
                category: rule.category.clone(),
            });
        }
    }

    let mut grouped = HashSet::new();
    for group in &file.categories {
        for signature in &group.signatures {
            let rule = file
                .rules
                .iter()
                .find(|r| &r.signature == signature)
                .ok_or_else(|| ConfigError::UndefinedSignature {
                    category: group.name.clone(),
                    signature: signature.clone(),
                })?;
            if !grouped.insert(signature.as_str()) {
                return Err(ConfigError::MultiplyGrouped(signature.clone()));
            }
            if rule.category != group.name {
                return Err(ConfigError::CategoryMismatch {
                    signature: signature.clone(),
                    grouped: group.name.clone(),
                    declared: rule.category.clone(),
                });
            }
        }
    }

    if let Some(rule) = file
        .rules
        .iter()
        .find(|r| !grouped.contains(r.signature.as_str()))
    {
        return Err(ConfigError::Ungrouped(rule.signature.clone()));
    }

    Ok(())
}
