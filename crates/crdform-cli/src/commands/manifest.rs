//! Manifest command - render a configuration to YAML without a cluster

use crdform_core::{ManifestConfig, ResourceConfig};
use crdform_kube::ManifestGenerator;
use std::path::PathBuf;

use crate::config::{ProviderArgs, load_values};
use crate::display::OutputFormat;
use crate::error::Result;

pub fn run(
    args: &ProviderArgs,
    kind: &str,
    files: &[PathBuf],
    set: &[String],
    output: Option<OutputFormat>,
) -> Result<()> {
    let registry = args.registry()?;
    let generator = ManifestGenerator::new(registry.lookup(kind)?);

    let values = load_values(files, set)?;
    // Resource-only controls (field_manager, wait_for, ...) are accepted and ignored
    let config = ResourceConfig::from_json(generator.descriptor(), values.inner())?;
    let state = generator.render(&ManifestConfig::from(config))?;

    match output {
        Some(format) => print!("{}", format.render(&state)?),
        None => print!("{}", state.yaml),
    }
    Ok(())
}
