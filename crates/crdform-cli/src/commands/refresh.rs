//! Refresh command - re-read an object and update its state file

use console::style;
use crdform_core::ComponentKind;
use std::path::Path;

use crate::config::{ProviderArgs, load_state, save_state};
use crate::display::OutputFormat;
use crate::error::Result;

pub async fn run(
    args: &ProviderArgs,
    state_path: &Path,
    output: Option<OutputFormat>,
) -> Result<()> {
    let provider = args.provider().await?;
    let (descriptor, state) = load_state(provider.registry(), state_path)?;
    let resource = provider.resource(&descriptor.type_name(ComponentKind::Resource))?;

    let refreshed = resource.read(&state).await?;
    save_state(state_path, &refreshed)?;

    match output {
        Some(format) => print!("{}", format.render(&refreshed)?),
        None => eprintln!(
            "{} Refreshed {} ({})",
            style("✓").green(),
            refreshed.id,
            resource.type_name()
        ),
    }
    Ok(())
}
