//! Critique CLI - Command line interface for critique
//!
//! Agent-orchestrated code review against project context.

mod commands;

use clap::{Parser, Subcommand};
use critique_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ReviewArgs, SecretsArgs};

/// Critique: agent-orchestrated code review
#[derive(Parser, Debug)]
#[command(name = "critique")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Chat endpoint base URL (overrides config and env)
    #[arg(long, global = true, env = "CRITIQUE_BASE_URL")]
    base_url: Option<String>,

    /// Model to use (overrides config and env)
    #[arg(long, global = true, env = "CRITIQUE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Review code changes against project context
    #[command(visible_alias = "r")]
    Review(ReviewArgs),

    /// Manage the API credential file
    Secrets(SecretsArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.base_url.clone(), cli.model.clone())?;

    if cli.verbose {
        tracing::info!(
            base_url = %config.model.base_url,
            model = %config.model.model,
            max_iterations = config.model.max_iterations,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("critique {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Review(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Secrets(args)) => {
            args.execute()?;
        }
        Some(Commands::Config) => {
            println!("Critique Configuration");
            println!("======================");
            println!();
            println!("Model Settings:");
            println!("  base_url: {}", config.model.base_url);
            println!("  model: {}", config.model.model);
            println!("  max_iterations: {}", config.model.max_iterations);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Critique - agent-orchestrated code review");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
