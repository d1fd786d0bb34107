use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use firefly_compiler::RecoveryStrategy;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "firefly")]
#[command(about = "Compile Firefly source trees", long_about = None, version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every .firefly file under a directory
    Compile {
        /// Root of the source tree
        source: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// Configuration file (defaults to firefly.toml in the source tree)
        #[arg(short, long, env = "FIREFLY_CONFIG")]
        config: Option<PathBuf>,

        /// Maximum number of units processed at once
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Keep going when a source file cannot be listed
        #[arg(long)]
        keep_going: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(cli.debug)
        .init();

    match cli.command {
        Commands::Compile {
            source,
            output,
            config,
            jobs,
            keep_going,
        } => {
            let mut config = firefly_cli::load_config(&source, config.as_deref())?;
            if let Some(jobs) = jobs {
                config = config.with_max_parallel_units(jobs);
            }
            if keep_going {
                config = config.with_input_errors(RecoveryStrategy::Continue);
            }

            let outcome = firefly_cli::compile_dir(&source, &output, config).await?;
            info!(
                "Compiled {} unit(s), wrote {} file(s) to {}",
                outcome.compiled,
                outcome.written.len(),
                output.display()
            );

            if outcome.summary.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                error!("Compilation reported {} error(s)", outcome.summary.total());
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
