//! Task store trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;
use entities::Task;

use crate::TaskStoreResult;

/// Trait for task storage operations.
///
/// Both backends answer the same contract with identical semantics. The
/// snapshot store keeps the authoritative set in memory and only touches
/// durable storage on `save`/`load`; the SQLite store round-trips every
/// call to the table, so any of its operations can surface a storage error.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Creates a task with the next identifier and `completed = false`,
    /// appends it to the set and returns it. Identifiers are strictly
    /// increasing from 1 and never reused, even after removals. Field
    /// content is not validated.
    async fn add(
        &self,
        title: &str,
        description: &str,
        due_date: NaiveDate,
    ) -> TaskStoreResult<Task>;

    /// Deletes the task with the given id. A missing id is a silent no-op.
    async fn remove(&self, id: i64) -> TaskStoreResult<()>;

    /// Gets a task by id. A miss is `None`, never an error.
    async fn get(&self, id: i64) -> TaskStoreResult<Option<Task>>;

    /// Marks the task with the given id completed. A missing id is a
    /// silent no-op.
    async fn complete(&self, id: i64) -> TaskStoreResult<()>;

    /// Lists all tasks in backend order: insertion order for the snapshot
    /// store, storage order for SQLite. Callers must not assume a sort.
    async fn list(&self) -> TaskStoreResult<Vec<Task>>;

    /// Lists tasks due strictly before `today` that are not completed.
    async fn overdue(&self, today: NaiveDate) -> TaskStoreResult<Vec<Task>>;

    /// Lists tasks due on or after `today`, completed or not.
    async fn upcoming(&self, today: NaiveDate) -> TaskStoreResult<Vec<Task>>;

    /// Writes the full current set to durable storage, replacing prior
    /// content. No partial write is visible on success. A no-op for
    /// backends that persist every operation as it happens.
    async fn save(&self) -> TaskStoreResult<()>;

    /// Replaces the in-memory set wholesale from durable storage; never
    /// merges. On failure the previous set is left exactly as it was. A
    /// no-op for backends that read storage on every operation.
    async fn load(&self) -> TaskStoreResult<()>;
}

/// Durable mirror consumed by the snapshot store.
///
/// The mirror holds whole-state copies only; it is not consulted by the
/// in-memory operations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Prepares the destination for use. Idempotent: safe to call when the
    /// destination already exists, without altering existing content.
    async fn ensure_initialized(&self) -> TaskStoreResult<()>;

    /// Replaces the stored state with `tasks`.
    async fn persist(&self, tasks: &[Task]) -> TaskStoreResult<()>;

    /// Reads the full stored state.
    async fn fetch_all(&self) -> TaskStoreResult<Vec<Task>>;
}
