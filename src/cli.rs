//! CLI definition for the agent task server.
//!
//! Flat argument set in clap derive style; the server is the only mode, so
//! there are no subcommands.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{DEFAULT_AGENT_PROGRAM, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SEED_CONFIG};

/// Local HTTP server for submitting tasks to an autonomous coding agent.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Bind host
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Bind port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Agent executable used to run tasks
    #[arg(long, default_value = DEFAULT_AGENT_PROGRAM)]
    pub agent: String,

    /// Project agent config copied into each run's isolated root (if present)
    #[arg(long, default_value = DEFAULT_SEED_CONFIG)]
    pub seed_config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,
}
