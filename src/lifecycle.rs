//! Task lifecycle management.
//!
//! Owns the `queued -> running -> completed | failed` state machine. Each
//! admitted task gets one worker spawned at submission time; the worker is
//! the only writer for its record and drives it to a terminal state no
//! matter what the run does.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::registry::TaskRegistry;
use crate::runner::AgentRunner;
use crate::types::{TaskParams, TaskRecord, TaskStatus};

/// Creates records and dispatches one worker per task.
///
/// Spawning is funneled through [`TaskManager::submit`] so a bounded worker
/// pool could be introduced here later without touching the state machine.
/// Today the number of in-flight workers is unbounded, matching the
/// submission-time dispatch the server promises.
#[derive(Clone)]
pub struct TaskManager {
    registry: TaskRegistry,
    runner: Arc<AgentRunner>,
}

impl TaskManager {
    pub fn new(runner: AgentRunner) -> Self {
        Self {
            registry: TaskRegistry::new(),
            runner: Arc::new(runner),
        }
    }

    /// Read access to the registry for the HTTP layer.
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Admit a task: insert the `queued` record, dispatch its worker, and
    /// return the generated id. Returns before the worker reaches `running`.
    pub fn submit(&self, params: TaskParams) -> Result<String> {
        let task_id = Uuid::new_v4().to_string();
        self.registry
            .create(TaskRecord::new(task_id.clone(), &params))?;
        info!(task_id = %task_id, "Task admitted");

        let registry = self.registry.clone();
        let runner = Arc::clone(&self.runner);
        let worker_task_id = task_id.clone();
        tokio::spawn(async move {
            run_worker(registry, runner, worker_task_id, params).await;
        });

        Ok(task_id)
    }
}

/// Carry one task from `queued` to a terminal state.
async fn run_worker(
    registry: TaskRegistry,
    runner: Arc<AgentRunner>,
    task_id: String,
    params: TaskParams,
) {
    let claimed = registry.update(&task_id, |record| {
        record.status = TaskStatus::Running;
        record.started_at = Some(Utc::now());
        record.error = None;
    });
    if !claimed {
        // Record vanished before the worker started; nothing to do.
        warn!(task_id = %task_id, "Task record missing at worker start; aborting");
        return;
    }

    // The only blocking point in the system. The runner folds every abnormal
    // condition into the outcome, so the worker always reaches the terminal
    // update below.
    let outcome = runner.run(&params).await;

    let status = if outcome.succeeded() {
        TaskStatus::Completed
    } else {
        TaskStatus::Failed
    };
    let applied = registry.update(&task_id, |record| {
        record.status = status;
        record.completed_at = Some(Utc::now());
        record.exit_code = Some(outcome.exit_code);
        record.stdout = Some(outcome.stdout.clone());
        record.stderr = Some(outcome.stderr.clone());
        record.error = outcome.failure.clone();
    });

    if applied {
        info!(
            task_id = %task_id,
            status = ?status,
            exit_code = outcome.exit_code,
            "Task finished"
        );
    } else {
        warn!(task_id = %task_id, "Task record missing at completion; result dropped");
    }
}
