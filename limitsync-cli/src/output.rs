//! Output formatting for the CLI
//!
//! Status lines stream as records finish; the run summary follows in the
//! selected format. With a JSON or YAML summary, stdout carries only that
//! document and the status lines move to stderr.

use clap::ValueEnum;
use colored::Colorize;
use limitsync_core::{FailureEntry, RecordOutcome, RunSummary};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Summary output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    #[value(alias = "yml")]
    Yaml,
}

impl OutputFormat {
    /// Whether status lines share stdout with the summary
    pub fn status_on_stdout(self) -> bool {
        self == OutputFormat::Table
    }
}

/// Print the status line for one record
pub fn print_outcome(outcome: &RecordOutcome, format: OutputFormat) {
    let line = outcome.to_string();
    let line = if outcome.is_success() {
        line.green()
    } else {
        line.red()
    };

    if format.status_on_stdout() {
        println!("{}", line);
    } else {
        eprintln!("{}", line);
    }
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Deployment")]
    deployment: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&FailureEntry> for FailureRow {
    fn from(entry: &FailureEntry) -> Self {
        let (namespace, deployment) = match &entry.target {
            Some(target) => (target.namespace.clone(), target.name.clone()),
            None => ("-".to_string(), "-".to_string()),
        };

        Self {
            line: entry
                .line
                .map(|line| line.to_string())
                .unwrap_or_else(|| "-".to_string()),
            namespace,
            deployment,
            reason: entry.reason.clone(),
        }
    }
}

/// Print the run summary in the specified format
pub fn print_summary(summary: &RunSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_summary_table(summary),
        OutputFormat::Json => print_json(summary)?,
        OutputFormat::Yaml => print_yaml(summary)?,
    }
    Ok(())
}

fn print_summary_table(summary: &RunSummary) {
    println!();

    if !summary.failures.is_empty() {
        let rows: Vec<FailureRow> = summary.failures.iter().map(FailureRow::from).collect();
        println!("{}", Table::new(rows));
    }

    let totals = format!(
        "{} records: {} updated, {} failed, {} malformed",
        summary.total, summary.updated, summary.failed, summary.malformed
    );
    if summary.has_failures() {
        println!("{}", totals.yellow().bold());
    } else {
        println!("{}", totals.green().bold());
    }

    if let Some(duration) = summary.duration() {
        println!("{}", format!("Finished in {} ms", duration.num_milliseconds()).dimmed());
    }

    if summary.interrupted {
        print_warning("Interrupted by shutdown request; remaining records were not processed");
    }
    if let Some(err) = &summary.input_error {
        print_error(&format!("Input stopped early: {}", err));
    }
}

/// Print data as pretty-printed JSON
pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

/// Print data as YAML
pub fn print_yaml<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    println!("{}", yaml);
    Ok(())
}

/// Print an error message with red X
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// Print a warning message with yellow triangle
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use limitsync_common::WorkloadRef;

    #[test]
    fn test_failure_row_with_target() {
        let entry = FailureEntry {
            line: Some(4),
            target: Some(WorkloadRef::new("prod", "ghost")),
            reason: "Failed to get deployment ghost in namespace prod: not found".to_string(),
        };

        let row = FailureRow::from(&entry);
        assert_eq!(row.line, "4");
        assert_eq!(row.namespace, "prod");
        assert_eq!(row.deployment, "ghost");
    }

    #[test]
    fn test_failure_row_for_malformed_record() {
        let entry = FailureEntry {
            line: None,
            target: None,
            reason: "failed to read input".to_string(),
        };

        let row = FailureRow::from(&entry);
        assert_eq!(row.line, "-");
        assert_eq!(row.deployment, "-");
    }

    #[test]
    fn test_structured_summaries_keep_stdout_clean() {
        assert!(OutputFormat::Table.status_on_stdout());
        assert!(!OutputFormat::Json.status_on_stdout());
        assert!(!OutputFormat::Yaml.status_on_stdout());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(OutputFormat::from_str("json", true), Ok(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("yml", true), Ok(OutputFormat::Yaml));
        assert!(OutputFormat::from_str("xml", true).is_err());
    }
}
