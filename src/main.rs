use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fonsync::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fonsync::AppCommand {
    fn from(cmd: Commands) -> fonsync::AppCommand {
        match cmd {
            Commands::Sync { dry_run } => fonsync::AppCommand::Sync { dry_run },
            Commands::Status => fonsync::AppCommand::Status,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Refresh companies and yields, then bring fund histories up to date
    Sync {
        /// Show where each fund would resume without downloading anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Display stored funds and their latest prices
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fonsync::cli::setup::setup_at_path(path),
            None => fonsync::cli::setup::setup(),
        },
        Some(cmd) => fonsync::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
