//! External agent process execution.
//!
//! Runs one agent invocation per task under an isolated config root, with a
//! hard wall-clock timeout. Every abnormal condition is folded into the
//! returned [`RunOutcome`]; this module never panics a worker.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::{AgentConfig, CONFIG_HOME_ENV};
use crate::isolation::ConfigRoot;
use crate::types::TaskParams;

/// POSIX convention for a timed-out command.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Sentinel for runs that never produced a child exit status.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -1;

/// Fixed execution guardrails appended to every submitted task.
const PROMPT_GUARDRAILS: &str = "Important execution requirements:\n\
- Apply changes directly to files in the working directory.\n\
- Do not delegate, do not spawn background subtasks, and do not use app generators.\n\
- Use direct file edit and shell tools only.\n\
- After editing, verify by reading the target file(s).\n";

/// Wrap the caller's task text in the fixed instructional template.
///
/// The task text is trimmed of surrounding whitespace and substituted in
/// verbatim; the wrapper is applied to every submission without exception.
pub fn wrap_task_prompt(task_text: &str) -> String {
    format!("{}\n\n{}", task_text.trim(), PROMPT_GUARDRAILS)
}

/// Structured outcome of one agent run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// `None` exactly when the run succeeded (exit code 0).
    pub failure: Option<String>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    fn launch_failure(reason: String) -> Self {
        Self {
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: String::new(),
            failure: Some(reason),
        }
    }
}

/// Synchronous-from-the-worker's-view executor for the external agent.
#[derive(Debug, Clone)]
pub struct AgentRunner {
    config: AgentConfig,
}

impl AgentRunner {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Execute the agent for one task and classify the result.
    ///
    /// The isolated config root lives for the duration of this call and is
    /// removed on return, whichever exit path is taken.
    pub async fn run(&self, params: &TaskParams) -> RunOutcome {
        let config_root = match ConfigRoot::create(Some(&self.config.seed_config)) {
            Ok(root) => root,
            Err(e) => {
                warn!(error = %e, "Failed to build isolated config root");
                return RunOutcome::launch_failure(e.to_string());
            }
        };

        let mut command = self.build_command(params, config_root.path());
        debug!(
            program = %self.config.program,
            working_directory = %params.working_directory.display(),
            timeout_seconds = params.timeout_seconds,
            "Spawning agent process"
        );

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %self.config.program, error = %e, "Failed to launch agent");
                return RunOutcome::launch_failure(format!(
                    "failed to launch {}: {}",
                    self.config.program, e
                ));
            }
        };

        // Drain both pipes concurrently so a chatty child cannot deadlock
        // against a full pipe buffer while we wait on it.
        let stdout_task = spawn_reader(child.stdout.take());
        let stderr_task = spawn_reader(child.stderr.take());

        let timeout = Duration::from_secs(params.timeout_seconds);
        let (exit_code, failure) = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => match status.code() {
                    Some(0) => (0, None),
                    Some(code) => (code, Some("agent returned non-zero exit code".to_string())),
                    None => (
                        LAUNCH_FAILURE_EXIT_CODE,
                        Some("agent terminated by signal".to_string()),
                    ),
                },
                Err(e) => (
                    LAUNCH_FAILURE_EXIT_CODE,
                    Some(format!("failed to wait on agent process: {e}")),
                ),
            },
            _ = tokio::time::sleep(timeout) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                (
                    TIMEOUT_EXIT_CODE,
                    Some(format!(
                        "agent timed out after {} seconds",
                        params.timeout_seconds
                    )),
                )
            }
        };

        // Killed or exited, the pipes are closed now; collect whatever was
        // written, including partial output from a timed-out run.
        let stdout = collect(stdout_task).await;
        let stderr = collect(stderr_task).await;

        RunOutcome {
            exit_code,
            stdout,
            stderr,
            failure,
        }
    }

    fn build_command(&self, params: &TaskParams, config_home: &Path) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .arg("run")
            .arg("--text")
            .arg(wrap_task_prompt(&params.task_text))
            .arg("--max-turns")
            .arg(params.max_turns.to_string())
            .arg("--max-tool-repetitions")
            .arg(params.max_tool_repetitions.to_string());

        if let Some(model) = &params.model {
            command.arg("--model").arg(model);
        }

        command
            .current_dir(&params.working_directory)
            .env(CONFIG_HOME_ENV, config_home)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        command
    }
}

fn spawn_reader<R>(stream: Option<R>) -> JoinHandle<String>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn collect(task: JoinHandle<String>) -> String {
    task.await.unwrap_or_default()
}
