//! Get command - read one object through the data source

use crate::config::ProviderArgs;
use crate::display::OutputFormat;
use crate::error::Result;

pub async fn run(
    args: &ProviderArgs,
    kind: &str,
    name: &str,
    namespace: &str,
    output: Option<OutputFormat>,
) -> Result<()> {
    let provider = args.provider().await?;
    let data_source = provider.data_source(kind)?;

    let state = data_source.read(name, namespace).await?;
    print!("{}", output.unwrap_or_default().render(&state)?);
    Ok(())
}
