//! Apply command - create, update or replace an object with server-side apply

use console::style;
use crdform_core::{ResourceConfig, StateRecord};
use crdform_kube::{ApplyError, PlanAction};
use std::path::{Path, PathBuf};

use crate::config::{ProviderArgs, load_state, load_values, save_state};
use crate::display::OutputFormat;
use crate::error::{CliError, Result};

pub async fn run(
    args: &ProviderArgs,
    kind: &str,
    files: &[PathBuf],
    set: &[String],
    state_path: Option<&Path>,
    output: Option<OutputFormat>,
) -> Result<()> {
    let provider = args.provider().await?;
    let resource = provider.resource(kind)?;

    let values = load_values(files, set)?;
    let config = ResourceConfig::from_json(resource.descriptor(), values.inner())?;

    let prior = match state_path {
        Some(path) if path.exists() => {
            let (descriptor, state) = load_state(provider.registry(), path)?;
            if descriptor.as_ref() != resource.descriptor() {
                return Err(CliError::usage_with_help(
                    format!(
                        "state file {} belongs to {}, not {}",
                        path.display(),
                        descriptor.kind,
                        resource.descriptor().kind
                    ),
                    "Use a separate state file per object",
                ));
            }
            Some(state)
        }
        _ => None,
    };

    let action = resource.plan(prior.as_ref(), &config);
    eprintln!(
        "{} {} {} ({})",
        style("→").blue(),
        style(action).bold(),
        config.metadata.id(),
        resource.type_name()
    );

    let result = match (action, prior) {
        (PlanAction::NoOp, Some(prior)) => {
            eprintln!("  {} No changes", style("✓").green());
            Ok(prior)
        }
        (PlanAction::Replace, Some(prior)) => {
            eprintln!(
                "  {} name or namespace changed, deleting {}",
                style("⚠").yellow(),
                prior.id
            );
            resource.delete(&prior).await?;
            // The prior object is gone: its state must not outlive it
            if let Some(path) = state_path {
                std::fs::remove_file(path)?;
            }
            resource.create(&config).await
        }
        (PlanAction::Update, Some(_)) => resource.update(&config).await,
        _ => resource.create(&config).await,
    };

    let state = match result {
        Ok(state) => state,
        Err(ApplyError {
            diagnostic,
            applied: Some(applied),
        }) => {
            persist(&applied, state_path, output)?;
            eprintln!(
                "  {} {} was applied but is not ready",
                style("⚠").yellow(),
                applied.id
            );
            return Err(diagnostic.into());
        }
        Err(err) => return Err(err.diagnostic.into()),
    };

    persist(&state, state_path, output)?;
    if let Some(path) = state_path {
        eprintln!(
            "  {} Applied {}, state written to {}",
            style("✓").green(),
            state.id,
            path.display()
        );
    }
    Ok(())
}

/// Write `state` to the state file, or print it when there is none
fn persist(
    state: &StateRecord,
    state_path: Option<&Path>,
    output: Option<OutputFormat>,
) -> Result<()> {
    match state_path {
        Some(path) => save_state(path, state),
        None => {
            print!("{}", output.unwrap_or_default().render(state)?);
            Ok(())
        }
    }
}
