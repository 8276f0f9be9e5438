//! Core types for the agent task server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle state of a task.
///
/// Transitions are one-directional: `queued -> running -> completed | failed`.
/// A terminal state never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Execution parameters resolved at admission time.
///
/// Defaults from [`crate::config`] are already applied; only `model` stays
/// optional because its absence means "let the agent pick".
#[derive(Debug, Clone)]
pub struct TaskParams {
    pub task_text: String,
    pub model: Option<String>,
    pub max_turns: u32,
    pub max_tool_repetitions: u32,
    pub timeout_seconds: u64,
    pub working_directory: PathBuf,
}

/// A task record — the unit of state owned by the registry.
///
/// Every field is always serialized; nullable fields are emitted as explicit
/// `null` so polling clients can rely on key presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub task_text: String,
    pub model: Option<String>,
    pub max_turns: u32,
    pub max_tool_repetitions: u32,
    pub timeout_seconds: u64,
    pub working_directory: PathBuf,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub error: Option<String>,
}

impl TaskRecord {
    /// Build a fresh `queued` record from admission parameters.
    pub fn new(task_id: String, params: &TaskParams) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            task_text: params.task_text.clone(),
            model: params.model.clone(),
            max_turns: params.max_turns,
            max_tool_repetitions: params.max_tool_repetitions,
            timeout_seconds: params.timeout_seconds,
            working_directory: params.working_directory.clone(),
            status: TaskStatus::Queued,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            exit_code: None,
            stdout: None,
            stderr: None,
            error: None,
        }
    }

    /// Execution parameters carried by this record.
    pub fn params(&self) -> TaskParams {
        TaskParams {
            task_text: self.task_text.clone(),
            model: self.model.clone(),
            max_turns: self.max_turns,
            max_tool_repetitions: self.max_tool_repetitions,
            timeout_seconds: self.timeout_seconds,
            working_directory: self.working_directory.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TaskParams {
        TaskParams {
            task_text: "add a readme".to_string(),
            model: None,
            max_turns: 40,
            max_tool_repetitions: 3,
            timeout_seconds: 300,
            working_directory: PathBuf::from("/tmp"),
        }
    }

    #[test]
    fn new_record_starts_queued_with_nulls() {
        let record = TaskRecord::new("abc".to_string(), &params());

        assert_eq!(record.status, TaskStatus::Queued);
        assert!(record.started_at.is_none());
        assert!(record.completed_at.is_none());
        assert!(record.exit_code.is_none());
        assert!(record.stdout.is_none());
        assert!(record.stderr.is_none());
        assert!(record.error.is_none());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Queued).unwrap(),
            "\"queued\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn nullable_fields_are_emitted_explicitly() {
        let record = TaskRecord::new("abc".to_string(), &params());
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();

        for key in [
            "model",
            "started_at",
            "completed_at",
            "exit_code",
            "stdout",
            "stderr",
            "error",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
            assert!(obj[key].is_null(), "expected null for {key}");
        }
    }

    #[test]
    fn terminal_states() {
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }
}
