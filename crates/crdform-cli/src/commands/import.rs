//! Import command - adopt an existing object into a state file

use console::style;
use std::path::Path;

use crate::config::{ProviderArgs, save_state};
use crate::display::OutputFormat;
use crate::error::Result;

pub async fn run(
    args: &ProviderArgs,
    kind: &str,
    id: &str,
    state_path: Option<&Path>,
    output: Option<OutputFormat>,
) -> Result<()> {
    let provider = args.provider().await?;
    let resource = provider.resource(kind)?;

    let seeded = resource.import_state(id)?;
    let state = resource.read(&seeded).await?;

    match state_path {
        Some(path) => {
            save_state(path, &state)?;
            eprintln!(
                "{} Imported {} into {}",
                style("✓").green(),
                state.id,
                path.display()
            );
        }
        None => print!("{}", output.unwrap_or_default().render(&state)?),
    }
    Ok(())
}
