//! voicecrm - Operator console for the voice-assistant CRM
//!
//! Entry point for the voicecrm CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use voicecrm::cli::{commands, Cli, Commands};
use voicecrm::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => {
            voicecrm::cli::completions::print(shell);
        }
        command => {
            // Load configuration only for runtime commands.
            let settings = Settings::load()?;
            init_logging(&settings, &command, cli.verbose);

            // Execute command
            match command {
                Commands::Calls(calls_cmd) => {
                    commands::calls_command(&settings, calls_cmd).await?;
                }
                Commands::Customers(customers_cmd) => {
                    commands::customers_command(&settings, customers_cmd).await?;
                }
                Commands::Export {
                    kind,
                    filters,
                    output,
                } => {
                    commands::export(&settings, kind, &filters, output).await?;
                }
                Commands::Metrics { from, to, json } => {
                    commands::show_metrics(&settings, from, to, json).await?;
                }
                Commands::Stats => {
                    commands::show_stats(&settings).await?;
                }
                Commands::Tui => {
                    voicecrm::tui::run(&settings).await?;
                }
                Commands::Config(config_cmd) => {
                    commands::config_command(&settings, config_cmd)?;
                }
                Commands::Completions { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}

fn init_logging(settings: &Settings, command: &Commands, verbose: bool) {
    // stderr output would tear the TUI's alternate screen
    let default_level = match (command, verbose) {
        (_, true) => "debug",
        (Commands::Tui, false) => "off",
        _ => settings.general.log_level.as_str(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
