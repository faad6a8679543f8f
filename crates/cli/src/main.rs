mod commands;
mod model_dir;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::{cmd_build, cmd_check, cmd_render};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Entity definition language toolchain.
#[derive(Parser)]
#[command(
    name = "entity-dsl",
    version,
    about = "Entity definition language toolchain"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Debug logs on stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a model and report its errors
    Check {
        /// Path to the .model file or to the entities directory
        model: PathBuf,
    },

    /// Build a model and print it
    Build {
        /// Path to the .model file or to the entities directory
        model: PathBuf,
    },

    /// Print the entities of a model back as entity text
    Render {
        /// Path to the .model file or to the entities directory
        model: PathBuf,
        /// Only render this entity
        #[arg(long)]
        entity: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { model } => {
            cmd_check(&model, cli.output, cli.quiet);
        }
        Commands::Build { model } => {
            cmd_build(&model, cli.output, cli.quiet);
        }
        Commands::Render { model, entity } => {
            cmd_render(&model, entity.as_deref(), cli.output, cli.quiet);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Report an error message in the chosen output format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
