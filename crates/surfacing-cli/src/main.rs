use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use surfacing_infrastructure::SurfacingPaths;

mod commands;
mod logging;
mod terminal;

#[derive(Parser)]
#[command(name = "surfacing")]
#[command(about = "Cinoa Surfacing - summon a prompt, attach the screen, ask Gemini", long_about = None)]
struct Cli {
    /// Use this directory instead of the platform config directory
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive panel in this terminal
    Run {
        /// Screenshot command that writes an image to stdout
        #[arg(long)]
        capture_command: Option<String>,

        /// Milliseconds to wait for the panel to hide before capturing
        #[arg(long, default_value_t = 200)]
        settle_ms: u64,
    },
    /// Send a single prompt and print the answer
    Ask {
        prompt: String,

        /// Image file to attach
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print all settings (the API key is masked)
    Show,
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = SurfacingPaths::new(cli.config_dir.as_deref());
    let _log_guard = logging::init(&paths, cli.verbose)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Run {
                capture_command,
                settle_ms,
            } => commands::run::run(&paths, capture_command.as_deref(), settle_ms).await,
            Commands::Ask { prompt, image } => {
                commands::ask::run(&paths, &prompt, image.as_deref()).await
            }
            Commands::Config { action } => match action {
                ConfigAction::Show => commands::config::show(&paths).await,
                ConfigAction::Get { key } => commands::config::get(&paths, &key).await,
                ConfigAction::Set { key, value } => {
                    commands::config::set(&paths, &key, &value).await
                }
            },
        }
    })
}
