//! Secrets command - manage the API credential file

use clap::{Args, Subcommand};
use critique_core::Secrets;

/// Arguments for the secrets command
#[derive(Args, Debug)]
pub struct SecretsArgs {
    #[command(subcommand)]
    pub command: SecretsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SecretsCommand {
    /// Create a template secrets file with secure permissions
    Init,
    /// Check whether an API key is configured
    Check,
}

impl SecretsArgs {
    /// Execute the secrets command
    pub fn execute(&self) -> anyhow::Result<()> {
        match self.command {
            SecretsCommand::Init => {
                let path = Secrets::create_template()?;
                println!("Created secrets template at {}", path.display());
                println!("Edit it and add your API key, or set CRITIQUE_API_KEY instead.");
            }
            SecretsCommand::Check => {
                let secrets = Secrets::load()?;
                if secrets.api_key().is_some() {
                    println!("API key configured");
                } else {
                    println!("No API key found");
                    println!("Set CRITIQUE_API_KEY or run: critique secrets init");
                }
            }
        }
        Ok(())
    }
}
