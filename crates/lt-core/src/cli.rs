//! Command-line interface for the classifier.
//!
//! Provides analyze, rules, categories, and check subcommands. Command
//! handlers write to caller-supplied streams so they can be driven from
//! tests without spawning a process.

use clap::{Args, Parser, Subcommand};
use lt_common::{Error, OutputFormat, Result, SCHEMA_VERSION};
use lt_config::{load_rule_table, ConfigPaths, Rule, RuleTable, RulesSource};
use serde_json::json;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::classify::{classify, split_lines, ActiveCategorySelection};
use crate::exit_codes::ExitCode;
use crate::logging::LogFormat;
use crate::report::{push_csv_row, render_columns, AnalysisReport};

/// Classify mainframe job log lines against known error signatures.
#[derive(Parser, Debug)]
#[command(name = "lt-core", version, about)]
pub struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Rules file (JSON). Defaults to the user config file, then built-in rules
    #[arg(long, env = "LT_RULES", value_name = "PATH", global = true)]
    pub rules: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify every line of a log file
    Analyze(AnalyzeArgs),
    /// List signature rules in precedence order
    Rules {
        /// Only show rules of this category
        #[arg(long)]
        category: Option<String>,
    },
    /// List categories and their signatures
    Categories,
    /// Validate the resolved rule table
    Check,
}

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Log file to read; stdin when omitted or `-`
    pub file: Option<PathBuf>,

    /// Only report lines containing a signature of these categories
    #[arg(short, long = "category", value_name = "NAME", value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Append a per-category bar chart to table output
    #[arg(long)]
    pub chart: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Resolve the rule table and dispatch the selected command.
pub fn run(cli: &Cli, stdin: &mut dyn Read, out: &mut dyn Write) -> Result<ExitCode> {
    let paths = ConfigPaths::for_user(cli.rules.clone());
    let (table, source) = load_rule_table(&paths)?;

    match &cli.command {
        Commands::Analyze(args) => analyze(cli.format, args, &table, source, stdin, out),
        Commands::Rules { category } => {
            list_rules(cli.format, category.as_deref(), &table, &source, out)
        }
        Commands::Categories => list_categories(cli.format, &table, out),
        Commands::Check => check(cli.format, &table, &source, out),
    }
}

/// Error rendering for the given format. JSON errors go to stdout so that
/// machine consumers always receive a document.
pub fn render_error(format: OutputFormat, err: &Error) -> String {
    match format {
        OutputFormat::Json => {
            let body = json!({
                "schema_version": SCHEMA_VERSION,
                "status": "error",
                "code": err.code(),
                "exit_code": ExitCode::for_error(err).as_i32(),
                "message": err.to_string(),
            });
            format!("{body}\n")
        }
        OutputFormat::Table | OutputFormat::Csv => format!("lt-core: error: {err}\n"),
    }
}

fn analyze(
    format: OutputFormat,
    args: &AnalyzeArgs,
    table: &RuleTable,
    source: RulesSource,
    stdin: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let bytes = match args.file.as_deref() {
        Some(path) if path.as_os_str() != "-" => read_file(path)?,
        _ => {
            let mut buf = Vec::new();
            stdin.read_to_end(&mut buf)?;
            buf
        }
    };
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::InvalidInput(format!("log is not valid UTF-8: {e}")))?;

    let active = ActiveCategorySelection::new(args.categories.iter().cloned());
    let records = classify(table, &text, &active)?;
    let report = AnalysisReport::new(
        source,
        table.fingerprint()?,
        active,
        split_lines(&text).count(),
        records,
    );
    info!(
        lines = report.total_lines,
        records = report.records.len(),
        known = report.known_count(),
        filtered = report.filtered_count(),
        "analysis finished"
    );

    let rendered = report.render(format, args.chart)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!(path = %path.display(), "report written");
        }
        None => out.write_all(rendered.as_bytes())?,
    }

    Ok(if report.known_count() > 0 {
        ExitCode::FindingsReady
    } else {
        ExitCode::Clean
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })
}

fn list_rules(
    format: OutputFormat,
    category: Option<&str>,
    table: &RuleTable,
    source: &RulesSource,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let rules: Vec<&Rule> = match category {
        Some(name) => {
            let signatures = table.signatures_for(name)?;
            table
                .lookup_all()
                .iter()
                .filter(|r| signatures.contains(&r.signature))
                .collect()
        }
        None => table.lookup_all().iter().collect(),
    };

    let rendered = match format {
        OutputFormat::Json => {
            let body = json!({
                "schema_version": SCHEMA_VERSION,
                "rules_source": source,
                "rules_fingerprint": table.fingerprint()?,
                "rules": rules,
            });
            format!("{}\n", serde_json::to_string_pretty(&body)?)
        }
        OutputFormat::Csv => {
            let mut csv = String::new();
            push_csv_row(&mut csv, ["Signature", "Category", "Remediation"]);
            for rule in &rules {
                push_csv_row(
                    &mut csv,
                    [
                        rule.signature.as_str(),
                        rule.category.as_str(),
                        rule.remediation.as_str(),
                    ],
                );
            }
            csv
        }
        OutputFormat::Table => {
            let rows: Vec<Vec<&str>> = rules
                .iter()
                .map(|r| vec![r.signature.as_str(), r.category.as_str(), r.remediation.as_str()])
                .collect();
            render_columns(&["Signature", "Category", "Remediation"], &rows)
        }
    };
    out.write_all(rendered.as_bytes())?;
    Ok(ExitCode::Clean)
}

fn list_categories(format: OutputFormat, table: &RuleTable, out: &mut dyn Write) -> Result<ExitCode> {
    let groups = table.category_groups();
    let rendered = match format {
        OutputFormat::Json => {
            let body = json!({
                "schema_version": SCHEMA_VERSION,
                "categories": groups,
            });
            format!("{}\n", serde_json::to_string_pretty(&body)?)
        }
        OutputFormat::Csv => {
            let mut csv = String::new();
            push_csv_row(&mut csv, ["Category", "Signatures"]);
            for group in groups {
                let joined = group.signatures.join(";");
                push_csv_row(&mut csv, [group.name.as_str(), joined.as_str()]);
            }
            csv
        }
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = groups
                .iter()
                .map(|g| vec![g.name.clone(), g.signatures.join(", ")])
                .collect();
            render_columns(&["Category", "Signatures"], &rows)
        }
    };
    out.write_all(rendered.as_bytes())?;
    Ok(ExitCode::Clean)
}

fn check(
    format: OutputFormat,
    table: &RuleTable,
    source: &RulesSource,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let fingerprint = table.fingerprint()?;
    let categories = table.all_categories().len();
    let rendered = match format {
        OutputFormat::Json => {
            let body = json!({
                "schema_version": SCHEMA_VERSION,
                "status": "ok",
                "rules_source": source,
                "rules_fingerprint": fingerprint,
                "rules": table.len(),
                "categories": categories,
                "description": table.description(),
            });
            format!("{}\n", serde_json::to_string_pretty(&body)?)
        }
        OutputFormat::Csv => {
            let mut csv = String::new();
            push_csv_row(&mut csv, ["status", "rules_source", "rules", "categories", "fingerprint"]);
            let source = source.to_string();
            let rules = table.len().to_string();
            let categories = categories.to_string();
            push_csv_row(
                &mut csv,
                ["ok", source.as_str(), rules.as_str(), categories.as_str(), fingerprint.as_str()],
            );
            csv
        }
        OutputFormat::Table => format!(
            "ok: {} rules in {} categories\nsource: {}\nfingerprint: {}\n",
            table.len(),
            categories,
            source,
            fingerprint
        ),
    };
    out.write_all(rendered.as_bytes())?;
    Ok(ExitCode::Clean)
}
