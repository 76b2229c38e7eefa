mod command;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use cronview_config::{CronSourceKind, CronViewConfig};

#[derive(Parser)]
#[command(name = "cronview", about = "Cron job report CLI")]
struct Cli {
    /// Config file (defaults to ~/.cronview/config.json5)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a chat command (e.g. "/cron") against the configured job source
    Command {
        /// Command text as typed in chat
        text: String,

        /// Sender identifier reported in logs
        #[arg(long)]
        sender: Option<String>,

        /// Treat the sender as unauthorized
        #[arg(long)]
        unauthorized: bool,

        /// Behave as if text commands were turned off
        #[arg(long)]
        no_text_commands: bool,
    },
    /// Show the effective configuration
    Health,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for the reply text.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Command {
            text,
            sender,
            unauthorized,
            no_text_commands,
        } => {
            let request = command::CommandRequest {
                text,
                sender,
                authorized: !unauthorized,
                allow_text_commands: config.commands.text && !no_text_commands,
            };
            let rt = tokio::runtime::Runtime::new()?;
            let outcome = rt.block_on(command::run_command(&config, request))?;
            let is_error = command::print_outcome(outcome.as_ref(), &mut std::io::stdout())?;
            if is_error {
                std::process::exit(1);
            }
        }
        Commands::Health => {
            println!("cronview is healthy");
            for line in health_lines(&config) {
                println!("  {line}");
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CronViewConfig> {
    match path {
        Some(path) => cronview_config::load_config_at(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => cronview_config::load_config().context("Failed to load config"),
    }
}

fn health_lines(config: &CronViewConfig) -> Vec<String> {
    let mut lines = vec![format!("text commands: {}", config.commands.text)];
    match config.cron.source {
        CronSourceKind::Store => {
            lines.push("job source: store".to_string());
            let store = match cronview_cron::resolve_store_path(config.cron.store.as_deref()) {
                Ok(path) => path.display().to_string(),
                Err(e) => format!("unresolved ({e})"),
            };
            lines.push(format!("store path: {store}"));
        }
        CronSourceKind::Gateway => {
            lines.push("job source: gateway".to_string());
            lines.push(format!("gateway url: {}", config.gateway.url));
            lines.push(format!("gateway timeout: {}ms", config.gateway.timeout_ms));
            lines.push(format!(
                "gateway token: {}",
                if config.gateway.auth_token.is_some() {
                    "set"
                } else {
                    "not set"
                }
            ));
        }
    }
    lines
}
