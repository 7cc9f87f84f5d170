//! Line classification against the signature rule table.
//!
//! Each input line is handled independently:
//! 1. **Filter**: with a non-empty category selection, a line survives only
//!    if it contains a signature of one of the selected categories. Lines that
//!    fail the filter produce no record at all, including would-be `Unknown`s.
//! 2. **Match**: the first rule in declaration order whose signature occurs in
//!    the line decides the category and remediation. Position in the line and
//!    signature length play no part.
//! 3. **Fallback**: a surviving line with no match is reported as `Unknown`.

use lt_config::{ConfigError, Rule, RuleTable, UNKNOWN_CATEGORY, UNKNOWN_REMEDIATION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Category selection
// ---------------------------------------------------------------------------

/// Categories chosen for a single analysis run.
///
/// An empty selection means "no filter", not "exclude everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveCategorySelection(BTreeSet<String>);

impl ActiveCategorySelection {
    /// Selection that lets every line through.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(categories.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.contains(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveCategorySelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

// ---------------------------------------------------------------------------
// Classification records
// ---------------------------------------------------------------------------

/// Outcome for one surviving input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationRecord {
    line: String,
    category: String,
    remediation: String,
}

impl ClassificationRecord {
    fn matched(line: &str, rule: &Rule) -> Self {
        Self {
            line: line.to_string(),
            category: rule.category.clone(),
            remediation: rule.remediation.clone(),
        }
    }

    fn unknown(line: &str) -> Self {
        Self {
            line: line.to_string(),
            category: UNKNOWN_CATEGORY.to_string(),
            remediation: UNKNOWN_REMEDIATION.to_string(),
        }
    }

    /// The original log line, without its terminator.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// A declared category, or `Unknown`.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn remediation(&self) -> &str {
        &self.remediation
    }

    /// Whether a signature matched this line.
    pub fn is_known(&self) -> bool {
        self.category != UNKNOWN_CATEGORY
    }
}

// ---------------------------------------------------------------------------
// Line splitting
// ---------------------------------------------------------------------------

/// Split text on line boundaries.
///
/// `\r\n` is one boundary. Each of `\n`, `\r`, vertical tab, form feed,
/// the file/group/record separators (`\x1c`-`\x1e`), NEL, U+2028 and U+2029
/// ends a line on its own.
///
/// A trailing line without a terminator is yielded; a trailing terminator
/// does not produce an extra empty line. Empty text yields nothing.
pub fn split_lines(text: &str) -> LogLines<'_> {
    LogLines { rest: text }
}

const LINE_BOUNDARIES: [char; 10] = [
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Iterator returned by [`split_lines`].
#[derive(Debug, Clone)]
pub struct LogLines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for LogLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        match self.rest.char_indices().find(|(_, c)| LINE_BOUNDARIES.contains(c)) {
            Some((idx, boundary)) => {
                let line = &self.rest[..idx];
                let len = if self.rest[idx..].starts_with("\r\n") {
                    2
                } else {
                    boundary.len_utf8()
                };
                self.rest = &self.rest[idx + len..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = "";
                Some(line)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Stateless classifier bound to a rule table.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'t> {
    table: &'t RuleTable,
}

impl<'t> Classifier<'t> {
    pub fn new(table: &'t RuleTable) -> Self {
        Self { table }
    }

    /// Classify every line of `text`, in order.
    ///
    /// Fails with [`ConfigError::UnknownCategory`] before any line is read if
    /// `active` names a category the table does not declare.
    pub fn classify(
        &self,
        text: &str,
        active: &ActiveCategorySelection,
    ) -> Result<Vec<ClassificationRecord>, ConfigError> {
        let records: Vec<_> = self.classify_iter(text, active)?.collect();
        debug!(
            records = records.len(),
            known = records.iter().filter(|r| r.is_known()).count(),
            "classification complete"
        );
        Ok(records)
    }

    /// Lazy form of [`Classifier::classify`]; the selection is still
    /// validated up front.
    pub fn classify_iter<'a>(
        &self,
        text: &'a str,
        active: &ActiveCategorySelection,
    ) -> Result<Records<'a>, ConfigError>
    where
        't: 'a,
    {
        let filter = self.filter_signatures(active)?;
        Ok(Records {
            lines: split_lines(text),
            table: self.table,
            filter,
        })
    }

    /// Match step only: classify a single line with no category filter.
    pub fn classify_line(&self, line: &str) -> ClassificationRecord {
        match self.table.find_match(line) {
            Some(rule) => ClassificationRecord::matched(line, rule),
            None => ClassificationRecord::unknown(line),
        }
    }

    /// Union of signatures owned by the selected categories, or `None` when
    /// the selection is empty.
    fn filter_signatures(
        &self,
        active: &ActiveCategorySelection,
    ) -> Result<Option<Vec<&'t str>>, ConfigError> {
        if active.is_empty() {
            return Ok(None);
        }
        let mut signatures = Vec::new();
        for category in active.iter() {
            let owned = self.table.signatures_for(category)?;
            signatures.extend(owned.iter().map(String::as_str));
        }
        debug!(
            categories = active.len(),
            signatures = signatures.len(),
            "category filter active"
        );
        Ok(Some(signatures))
    }
}

/// Lazy record sequence produced by [`Classifier::classify_iter`].
#[derive(Debug, Clone)]
pub struct Records<'a> {
    lines: LogLines<'a>,
    table: &'a RuleTable,
    filter: Option<Vec<&'a str>>,
}

impl Iterator for Records<'_> {
    type Item = ClassificationRecord;

    fn next(&mut self) -> Option<ClassificationRecord> {
        loop {
            let line = self.lines.next()?;
            if let Some(signatures) = &self.filter {
                if !signatures.iter().any(|sig| line.contains(sig)) {
                    trace!(line, "filtered out");
                    continue;
                }
            }
            return Some(Classifier::new(self.table).classify_line(line));
        }
    }
}

/// Classify `text` against `table`. See [`Classifier::classify`].
pub fn classify(
    table: &RuleTable,
    text: &str,
    active: &ActiveCategorySelection,
) -> Result<Vec<ClassificationRecord>, ConfigError> {
    Classifier::new(table).classify(text, active)
}
