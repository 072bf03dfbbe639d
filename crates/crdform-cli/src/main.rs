//! crdform CLI - manage Kubernetes custom resources with server-side apply

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

mod commands;
mod config;
mod display;
mod error;
mod exit_codes;

use commands::schema::ComponentArg;
use config::ProviderArgs;
use display::OutputFormat;

#[derive(Parser)]
#[command(name = "crdform")]
#[command(author = "crdform Contributors")]
#[command(version)]
#[command(
    about = "Manage Kubernetes custom resources declaratively with server-side apply",
    long_about = None
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    provider: ProviderArgs,

    /// Output format for structured results
    #[arg(short = 'o', long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered kinds
    Kinds,

    /// Print the attribute schema of a kind
    Schema {
        /// Kind, plural, `plural.group` or type name
        kind: String,

        /// Component to describe
        #[arg(short, long, value_enum, default_value_t = ComponentArg::Resource)]
        component: ComponentArg,
    },

    /// Validate a configuration without contacting the cluster
    Validate {
        kind: String,

        /// Configuration file(s) to merge
        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        /// Set values on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,
    },

    /// Render a configuration as a YAML manifest
    Manifest {
        kind: String,

        /// Configuration file(s) to merge
        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        /// Set values on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,
    },

    /// Read an object from the cluster
    Get {
        kind: String,

        /// Object name
        name: String,

        /// Object namespace
        #[arg(short, long, default_value = "default")]
        namespace: String,
    },

    /// Create or update an object with server-side apply
    Apply {
        kind: String,

        /// Configuration file(s) to merge
        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        /// Set values on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// State file: read to plan, written after apply
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Re-read an object and update its state file
    Refresh {
        /// State file
        #[arg(long)]
        state: PathBuf,
    },

    /// Delete an object and remove its state file
    Delete {
        /// State file
        #[arg(long)]
        state: PathBuf,
    },

    /// Adopt an existing object (`namespace/name`)
    Import {
        kind: String,

        /// Import identifier in the form `namespace/name`
        id: String,

        /// State file to write
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let env = std::env::var("CRDFORM_LOG").unwrap_or_else(|_| default_level.to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

async fn run(cli: Cli) -> error::Result<()> {
    let args = &cli.provider;
    let output = cli.output;

    match cli.command {
        Commands::Kinds => commands::kinds::run(args, output),

        Commands::Schema { kind, component } => {
            commands::schema::run(args, &kind, component, output)
        }

        Commands::Validate { kind, files, set } => {
            commands::validate::run(args, &kind, &files, &set, output)
        }

        Commands::Manifest { kind, files, set } => {
            commands::manifest::run(args, &kind, &files, &set, output)
        }

        Commands::Get {
            kind,
            name,
            namespace,
        } => commands::get::run(args, &kind, &name, &namespace, output).await,

        Commands::Apply {
            kind,
            files,
            set,
            state,
        } => commands::apply::run(args, &kind, &files, &set, state.as_deref(), output).await,

        Commands::Refresh { state } => commands::refresh::run(args, &state, output).await,

        Commands::Delete { state } => commands::delete::run(args, &state).await,

        Commands::Import { kind, id, state } => {
            commands::import::run(args, &kind, &id, state.as_deref(), output).await
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
