//! Server defaults and agent invocation configuration.

use std::path::PathBuf;

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8765;

/// Default cap on agent conversation turns.
pub const DEFAULT_MAX_TURNS: u32 = 40;

/// Default cap on consecutive identical tool calls.
pub const DEFAULT_MAX_TOOL_REPETITIONS: u32 = 3;

/// Default wall-clock timeout for a single run.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Agent executable invoked for each task.
pub const DEFAULT_AGENT_PROGRAM: &str = "goose";

/// Project-level agent configuration seeded into each isolated run.
pub const DEFAULT_SEED_CONFIG: &str = "goose_config.yaml";

/// Environment variable redirected to the per-run isolated config root.
pub const CONFIG_HOME_ENV: &str = "XDG_CONFIG_HOME";

/// Subdirectory under the config root where the agent looks for its config.
pub const AGENT_CONFIG_SUBDIR: &str = "goose";

/// File name the agent expects inside [`AGENT_CONFIG_SUBDIR`].
pub const AGENT_CONFIG_FILE: &str = "config.yaml";

/// How the external agent is invoked.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Executable name or path.
    pub program: String,
    /// Project config file copied into each run's isolated root, if it exists.
    pub seed_config: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_AGENT_PROGRAM.to_string(),
            seed_config: PathBuf::from(DEFAULT_SEED_CONFIG),
        }
    }
}
