//! Schema command - print the attribute tree of one component

use clap::ValueEnum;
use console::style;
use crdform_core::ComponentKind;

use crate::config::ProviderArgs;
use crate::display::OutputFormat;
use crate::error::{CliError, Result};

/// Which component's schema to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ComponentArg {
    #[default]
    Resource,
    DataSource,
    Manifest,
}

impl From<ComponentArg> for ComponentKind {
    fn from(arg: ComponentArg) -> Self {
        match arg {
            ComponentArg::Resource => ComponentKind::Resource,
            ComponentArg::DataSource => ComponentKind::DataSource,
            ComponentArg::Manifest => ComponentKind::Manifest,
        }
    }
}

pub fn run(
    args: &ProviderArgs,
    kind: &str,
    component: ComponentArg,
    output: Option<OutputFormat>,
) -> Result<()> {
    let registry = args.registry()?;
    let descriptor = registry.lookup(kind)?;
    let component = ComponentKind::from(component);

    let attributes = descriptor.component_schema(component);
    print!("{}", output.unwrap_or_default().render(&attributes)?);

    let problems = descriptor.schema.check_consistency();
    if !problems.is_empty() {
        for path in &problems {
            eprintln!(
                "{} required and omit-when-unset disagree at {}",
                style("⚠").yellow(),
                path
            );
        }
        return Err(CliError::validation(format!(
            "{} has {} inconsistent attribute(s)",
            descriptor.type_name(component),
            problems.len()
        )));
    }
    Ok(())
}
