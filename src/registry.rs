//! Concurrency-safe in-memory task store.

use anyhow::{Result, bail};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::types::TaskRecord;

/// The single source of truth for task state.
///
/// The backing map is never exposed; all access goes through the synchronized
/// operations below, and reads hand out clones so no caller can observe a
/// torn record or mutate shared state. Records are never evicted for the life
/// of the process (no retention policy is defined; see DESIGN.md).
#[derive(Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<Mutex<HashMap<String, TaskRecord>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record. Errors if the id is already present, which a
    /// UUID-generating caller should never trigger.
    pub fn create(&self, record: TaskRecord) -> Result<String> {
        let mut tasks = self.inner.lock().unwrap();
        if tasks.contains_key(&record.task_id) {
            bail!("duplicate task id: {}", record.task_id);
        }
        let task_id = record.task_id.clone();
        tasks.insert(task_id.clone(), record);
        Ok(task_id)
    }

    /// Snapshot of a single record.
    pub fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.inner.lock().unwrap().get(task_id).cloned()
    }

    /// Snapshot of every record at call time. Ordering is not guaranteed.
    pub fn list(&self) -> Vec<TaskRecord> {
        self.inner.lock().unwrap().values().cloned().collect()
    }

    /// Apply a transition atomically and refresh `updated_at`.
    ///
    /// Returns `false` without side effects when the id is unknown, so a
    /// worker racing process teardown can never crash the server.
    pub fn update<F>(&self, task_id: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut TaskRecord),
    {
        let mut tasks = self.inner.lock().unwrap();
        match tasks.get_mut(task_id) {
            Some(record) => {
                mutate(record);
                record.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaskParams, TaskStatus};
    use std::path::PathBuf;

    fn record(id: &str) -> TaskRecord {
        TaskRecord::new(
            id.to_string(),
            &TaskParams {
                task_text: "do the thing".to_string(),
                model: None,
                max_turns: 40,
                max_tool_repetitions: 3,
                timeout_seconds: 300,
                working_directory: PathBuf::from("/tmp"),
            },
        )
    }

    #[test]
    fn create_then_get_round_trips() {
        let registry = TaskRegistry::new();
        let id = registry.create(record("t1")).unwrap();

        let found = registry.get(&id).expect("record should exist");
        assert_eq!(found.task_id, "t1");
        assert_eq!(found.status, TaskStatus::Queued);
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let registry = TaskRegistry::new();
        registry.create(record("t1")).unwrap();

        assert!(registry.create(record("t1")).is_err());
    }

    #[test]
    fn get_unknown_id_is_none() {
        let registry = TaskRegistry::new();
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn list_returns_all_records() {
        let registry = TaskRegistry::new();
        registry.create(record("a")).unwrap();
        registry.create(record("b")).unwrap();
        registry.create(record("c")).unwrap();

        let mut ids: Vec<String> = registry.list().into_iter().map(|r| r.task_id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn update_applies_mutation_and_refreshes_updated_at() {
        let registry = TaskRegistry::new();
        registry.create(record("t1")).unwrap();
        let before = registry.get("t1").unwrap().updated_at;

        let applied = registry.update("t1", |r| {
            r.status = TaskStatus::Running;
            r.started_at = Some(Utc::now());
        });

        assert!(applied);
        let after = registry.get("t1").unwrap();
        assert_eq!(after.status, TaskStatus::Running);
        assert!(after.started_at.is_some());
        assert!(after.updated_at >= before);
    }

    #[test]
    fn update_unknown_id_is_silent_noop() {
        let registry = TaskRegistry::new();
        registry.create(record("t1")).unwrap();

        let applied = registry.update("ghost", |r| r.status = TaskStatus::Failed);

        assert!(!applied);
        assert_eq!(registry.get("t1").unwrap().status, TaskStatus::Queued);
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn snapshots_do_not_alias_the_store() {
        let registry = TaskRegistry::new();
        registry.create(record("t1")).unwrap();

        let mut snapshot = registry.get("t1").unwrap();
        snapshot.status = TaskStatus::Failed;

        assert_eq!(registry.get("t1").unwrap().status, TaskStatus::Queued);
    }
}
