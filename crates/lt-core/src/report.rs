//! Reports built from classification records.
//!
//! Renderers are pure: each takes records (or counts) and returns a `String`.
//! - Table: aligned `Log | Category | Fix` columns
//! - CSV: `Log,Category,Fix` header, RFC 4180 quoting
//! - Chart: horizontal text bars of record counts per category
//! - JSON: [`AnalysisReport`] envelope

use chrono::{DateTime, Utc};
use lt_common::{OutputFormat, Result, SCHEMA_VERSION};
use lt_config::RulesSource;
use serde::Serialize;
use std::borrow::Cow;

use crate::classify::{ActiveCategorySelection, ClassificationRecord};

/// Column headers shared by the table and CSV renderings.
pub const RECORD_HEADERS: [&str; 3] = ["Log", "Category", "Fix"];

/// Widest bar in the category chart, in cells.
pub const CHART_WIDTH: usize = 40;

const CHART_TITLE: &str = "Error Categories Found";

/// Number of records that landed in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Count records per category, `Unknown` included.
///
/// Sorted by descending count; ties keep first-appearance order.
pub fn summarize(records: &[ClassificationRecord]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for record in records {
        match counts.iter_mut().find(|c| c.category == record.category()) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                category: record.category().to_string(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

// ---------------------------------------------------------------------------
// Text renderers
// ---------------------------------------------------------------------------

/// Render rows as left-aligned columns separated by ` | `.
pub fn render_columns<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.as_ref().chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, rule.iter().map(String::as_str), &widths);
    for row in rows {
        push_row(&mut out, row.iter().map(|cell| cell.as_ref()), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let last = widths.len().saturating_sub(1);
    for (i, (cell, width)) in cells.zip(widths).enumerate() {
        if i > 0 {
            out.push_str(" | ");
        }
        out.push_str(cell);
        if i < last {
            let pad = width.saturating_sub(cell.chars().count());
            out.extend(std::iter::repeat(' ').take(pad));
        }
    }
    out.push('\n');
}

/// Aligned table of records.
pub fn render_table(records: &[ClassificationRecord]) -> String {
    let rows: Vec<Vec<&str>> = records
        .iter()
        .map(|r| vec![r.line(), r.category(), r.remediation()])
        .collect();
    render_columns(&RECORD_HEADERS, &rows)
}

/// Quote a CSV field if it contains a delimiter, quote, or line break.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Write one CSV row, `\n` terminated.
pub fn push_csv_row<'a>(out: &mut String, cells: impl IntoIterator<Item = &'a str>) {
    for (i, cell) in cells.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(cell));
    }
    out.push('\n');
}

/// CSV export with a `Log,Category,Fix` header.
pub fn render_csv(records: &[ClassificationRecord]) -> String {
    let mut out = String::new();
    push_csv_row(&mut out, RECORD_HEADERS);
    for record in records {
        push_csv_row(&mut out, [record.line(), record.category(), record.remediation()]);
    }
    out
}

/// Horizontal bar chart of category counts.
pub fn render_chart(summary: &[CategoryCount]) -> String {
    let mut out = format!("{CHART_TITLE}\n");
    let Some(max) = summary.iter().map(|c| c.count).max() else {
        out.push_str("(no records)\n");
        return out;
    };
    let label_width = summary
        .iter()
        .map(|c| c.category.chars().count())
        .max()
        .unwrap_or(0);
    for entry in summary {
        // Round up so every non-zero count gets at least one cell.
        let cells = (entry.count * CHART_WIDTH).div_ceil(max);
        let pad = label_width - entry.category.chars().count();
        out.push_str(&entry.category);
        out.extend(std::iter::repeat(' ').take(pad));
        out.push_str(" | ");
        out.push_str(&"#".repeat(cells));
        out.push_str(&format!(" {}\n", entry.count));
    }
    out
}

// ---------------------------------------------------------------------------
// Analysis report
// ---------------------------------------------------------------------------

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub schema_version: String,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub rules_source: RulesSource,
    pub rules_fingerprint: String,
    pub active_categories: ActiveCategorySelection,
    /// Lines in the input, before filtering.
    pub total_lines: usize,
    pub records: Vec<ClassificationRecord>,
    pub summary: Vec<CategoryCount>,
}

impl AnalysisReport {
    pub fn new(
        rules_source: RulesSource,
        rules_fingerprint: String,
        active_categories: ActiveCategorySelection,
        total_lines: usize,
        records: Vec<ClassificationRecord>,
    ) -> Self {
        let summary = summarize(&records);
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            rules_source,
            rules_fingerprint,
            active_categories,
            total_lines,
            records,
            summary,
        }
    }

    /// Records whose line matched a signature.
    pub fn known_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_known()).count()
    }

    /// Input lines that produced no record.
    pub fn filtered_count(&self) -> usize {
        self.total_lines.saturating_sub(self.records.len())
    }

    /// Render in the requested format. `chart` only affects table output.
    pub fn render(&self, format: OutputFormat, chart: bool) -> Result<String> {
        match format {
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(self)?;
                json.push('\n');
                Ok(json)
            }
            OutputFormat::Csv => Ok(render_csv(&self.records)),
            OutputFormat::Table => {
                if self.records.is_empty() {
                    return Ok("No matching log lines.\n".to_string());
                }
                let mut out = render_table(&self.records);
                if chart {
                    out.push('\n');
                    out.push_str(&render_chart(&self.summary));
                }
                Ok(out)
            }
        }
    }
}
