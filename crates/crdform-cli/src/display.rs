//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Provider diagnostics on stderr
//! - Validation issues grouped by attribute block
//! - Machine-readable output in YAML or JSON

use clap::ValueEnum;
use console::style;
use crdform_core::{Diagnostic, Severity, ValidationIssue};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;

/// Output format for structured results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// Serialize `value` in this format
    pub fn render<T: Serialize>(self, value: &T) -> Result<String> {
        Ok(match self {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(value)?;
                json.push('\n');
                json
            }
        })
    }
}

/// Print a provider diagnostic to stderr
pub fn print_diagnostic(diag: &Diagnostic) {
    let label = match diag.severity {
        Severity::Error => style("error:").red().bold(),
        Severity::Warning => style("warning:").yellow().bold(),
    };
    eprintln!("{} {}", label, diag.summary);
    for line in diag.detail.lines() {
        eprintln!("  {}", style(line).dim());
    }
}

/// Validation results for display
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub kind: String,
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(kind: impl Into<String>, errors: Vec<ValidationIssue>) -> Self {
        Self {
            kind: kind.into(),
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Display issues grouped by top-level block (`metadata`, `spec`, ...)
    pub fn display(&self) {
        let mut by_block: BTreeMap<&str, Vec<&ValidationIssue>> = BTreeMap::new();
        for issue in &self.errors {
            let block = issue
                .path
                .split(['.', '['])
                .next()
                .unwrap_or(issue.path.as_str());
            by_block.entry(block).or_default().push(issue);
        }

        for (block, issues) in by_block {
            println!();
            println!("{}", style(block).cyan().bold());
            for issue in issues {
                println!(
                    "  {} {} at {}",
                    style("✗").red(),
                    issue.message,
                    style(&issue.path).dim()
                );
            }
        }
    }
}
