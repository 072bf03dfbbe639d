//! Delete command - delete an object and drop its state file

use console::style;
use crdform_core::ComponentKind;
use std::path::Path;

use crate::config::{ProviderArgs, load_state};
use crate::error::Result;

pub async fn run(args: &ProviderArgs, state_path: &Path) -> Result<()> {
    let provider = args.provider().await?;
    let (descriptor, state) = load_state(provider.registry(), state_path)?;
    let resource = provider.resource(&descriptor.type_name(ComponentKind::Resource))?;

    eprintln!("{} Deleting {} ({})", style("→").blue(), state.id, resource.type_name());
    resource.delete(&state).await?;

    // State is only dropped once the cluster accepted the delete
    std::fs::remove_file(state_path)?;
    eprintln!("{} Deleted {}", style("✓").green(), state.id);
    Ok(())
}
