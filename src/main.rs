use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use answer_tracker_lib::access_gate::AccessGate;
use answer_tracker_lib::config::AppConfig;
use answer_tracker_lib::enrichment::OpenAiStudyClient;
use answer_tracker_lib::{server, AppState};

#[derive(Parser)]
#[command(
    name = "answer-tracker",
    about = "Track missed quiz answers and study them",
    version
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve {
        /// Address to listen on, overrides the config file
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(config, bind).await?,
        Command::Config => print!("{}", config.to_redacted_toml()?),
    }

    Ok(())
}

async fn serve(config: AppConfig, bind: Option<String>) -> anyhow::Result<()> {
    if config.study.api_key.is_none() {
        log::warn!("OPENAI_API_KEY is not set; study material lookups will fail");
    }

    let source = OpenAiStudyClient::new(&config.study)
        .context("Failed to build study material client")?;
    let state = AppState::new(Arc::new(source));
    let gate = AccessGate::from_config(&config.auth);

    let bind = bind.unwrap_or(config.server.bind);
    let handle = server::start_server(&bind, state, gate)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    handle.stop().await;

    Ok(())
}
