//! Validate command - check a configuration against a kind's schema

use console::style;
use crdform_core::ResourceConfig;
use std::path::PathBuf;

use crate::config::{ProviderArgs, load_values};
use crate::display::{OutputFormat, ValidationReport};
use crate::error::{CliError, Result};

pub fn run(
    args: &ProviderArgs,
    kind: &str,
    files: &[PathBuf],
    set: &[String],
    output: Option<OutputFormat>,
) -> Result<()> {
    let registry = args.registry()?;
    let descriptor = registry.lookup(kind)?;

    if output.is_none() {
        eprintln!(
            "{} Validating {} configuration",
            style("→").blue(),
            descriptor.kind
        );
    }

    let values = load_values(files, set)?;
    let config = ResourceConfig::from_json(&descriptor, values.inner())?;
    let report = ValidationReport::new(descriptor.kind.clone(), config.validate(&descriptor));

    match output {
        Some(format) => print!("{}", format.render(&report)?),
        None if report.valid => println!("{} Configuration is valid", style("✓").green()),
        None => report.display(),
    }

    if report.valid {
        Ok(())
    } else {
        Err(CliError::validation(format!(
            "{} configuration has {} error(s)",
            descriptor.kind,
            report.errors.len()
        )))
    }
}
