//! Agent Task Server
//!
//! Local HTTP server that accepts free-text task submissions, runs each one
//! through an external autonomous agent, and serves status to polling
//! clients.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use agent_task_server::cli::Cli;
use agent_task_server::config::AgentConfig;
use agent_task_server::lifecycle::TaskManager;
use agent_task_server::runner::AgentRunner;
use agent_task_server::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    info!(
        "Starting agent task server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Agent program: {}", cli.agent);
    info!("Seed config: {}", cli.seed_config.display());

    let agent_config = AgentConfig {
        program: cli.agent,
        seed_config: cli.seed_config,
    };
    let manager = TaskManager::new(AgentRunner::new(agent_config));
    let state = AppState::new(manager);

    server::serve(&cli.host, cli.port, state).await
}
