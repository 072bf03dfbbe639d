//! Kinds command - list registered kinds and their component type names

use console::style;
use crdform_core::ComponentKind;
use serde::Serialize;

use crate::config::ProviderArgs;
use crate::display::OutputFormat;
use crate::error::Result;

#[derive(Serialize)]
struct KindSummary {
    kind: String,
    api_version: String,
    resource: String,
    namespaced: bool,
    data_source: String,
    manifest: String,
}

pub fn run(args: &ProviderArgs, output: Option<OutputFormat>) -> Result<()> {
    let registry = args.registry()?;

    let summaries: Vec<KindSummary> = registry
        .kinds()
        .iter()
        .map(|k| KindSummary {
            kind: k.kind.clone(),
            api_version: k.api_version(),
            resource: k.resource_name(),
            namespaced: k.namespaced,
            data_source: k.type_name(ComponentKind::DataSource),
            manifest: k.type_name(ComponentKind::Manifest),
        })
        .collect();

    if let Some(format) = output {
        print!("{}", format.render(&summaries)?);
        return Ok(());
    }

    println!(
        "{:<24} {:<24} {}",
        style("KIND").bold(),
        style("API VERSION").bold(),
        style("RESOURCE").bold()
    );
    for summary in &summaries {
        println!(
            "{:<24} {:<24} {}",
            style(&summary.kind).cyan(),
            summary.api_version,
            summary.resource
        );
        println!("  {} {}", style("resource / data source:").dim(), summary.data_source);
        println!("  {} {}", style("manifest:").dim(), summary.manifest);
    }
    Ok(())
}
