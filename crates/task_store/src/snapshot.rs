//! Snapshot-backed task store.
//!
//! The store owns the authoritative in-memory task set; durable storage is
//! a whole-state mirror exchanged through an explicit `save`/`load`. In
//! between, the set and the mirror are allowed to diverge.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use entities::Task;
use tokio::sync::RwLock;
use tracing::info;

use crate::{StorageBackend, TaskStore, TaskStoreResult};

#[derive(Debug)]
struct SnapshotState {
    tasks: Vec<Task>,
    next_id: i64,
}

/// Task store holding the authoritative set in memory.
///
/// Mutations and queries never touch the durable mirror, so they cannot
/// fail from storage concerns. Identifiers come from a counter starting at
/// 1 that is never rewound by removals; `load` moves the counter past the
/// highest identifier it read so the strictly-increasing guarantee holds
/// across a reload.
pub struct SnapshotTaskStore<B> {
    backend: B,
    inner: RwLock<SnapshotState>,
}

impl<B: StorageBackend> SnapshotTaskStore<B> {
    /// Creates an empty store bound to `backend` and prepares the backend
    /// destination.
    pub async fn new(backend: B) -> TaskStoreResult<Self> {
        backend.ensure_initialized().await?;
        Ok(Self {
            backend,
            inner: RwLock::new(SnapshotState {
                tasks: Vec::new(),
                next_id: 1,
            }),
        })
    }
}

#[async_trait]
impl<B: StorageBackend> TaskStore for SnapshotTaskStore<B> {
    async fn add(
        &self,
        title: &str,
        description: &str,
        due_date: NaiveDate,
    ) -> TaskStoreResult<Task> {
        let mut state = self.inner.write().await;
        let task = Task::new(state.next_id, title, description, due_date);
        state.next_id += 1;
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn remove(&self, id: i64) -> TaskStoreResult<()> {
        let mut state = self.inner.write().await;
        state.tasks.retain(|task| task.id != id);
        Ok(())
    }

    async fn get(&self, id: i64) -> TaskStoreResult<Option<Task>> {
        let state = self.inner.read().await;
        Ok(state.tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn complete(&self, id: i64) -> TaskStoreResult<()> {
        let mut state = self.inner.write().await;
        if let Some(task) = state.tasks.iter_mut().find(|task| task.id == id) {
            task.mark_as_completed();
        }
        Ok(())
    }

    async fn list(&self) -> TaskStoreResult<Vec<Task>> {
        let state = self.inner.read().await;
        Ok(state.tasks.clone())
    }

    async fn overdue(&self, today: NaiveDate) -> TaskStoreResult<Vec<Task>> {
        let state = self.inner.read().await;
        Ok(state
            .tasks
            .iter()
            .filter(|task| task.is_overdue(today))
            .cloned()
            .collect())
    }

    async fn upcoming(&self, today: NaiveDate) -> TaskStoreResult<Vec<Task>> {
        let state = self.inner.read().await;
        Ok(state
            .tasks
            .iter()
            .filter(|task| task.is_upcoming(today))
            .cloned()
            .collect())
    }

    async fn save(&self) -> TaskStoreResult<()> {
        let state = self.inner.read().await;
        self.backend.persist(&state.tasks).await?;
        info!(count = state.tasks.len(), "task snapshot saved");
        Ok(())
    }

    async fn load(&self) -> TaskStoreResult<()> {
        // Fetch before taking the write lock: a failed fetch must leave the
        // current set exactly as it was.
        let tasks = self.backend.fetch_all().await?;
        let next_id = tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1;

        let mut state = self.inner.write().await;
        info!(count = tasks.len(), "task snapshot loaded");
        state.tasks = tasks;
        state.next_id = next_id;
        Ok(())
    }
}

/// Whole-file JSON snapshot of the task set.
///
/// `persist` replaces the file contents wholesale; `fetch_all` parses the
/// whole file. There is no schema versioning: a record missing a required
/// field fails with a format error.
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    /// Creates a snapshot backend writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StorageBackend for JsonSnapshot {
    async fn ensure_initialized(&self) -> TaskStoreResult<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        Ok(())
    }

    async fn persist(&self, tasks: &[Task]) -> TaskStoreResult<()> {
        let json = serde_json::to_string_pretty(tasks)?;

        // Stage to a sibling file, then rename over the destination so a
        // failed write never clobbers the previous snapshot.
        let staged = self.path.with_extension("tmp");
        tokio::fs::write(&staged, json).await?;
        tokio::fs::rename(&staged, &self.path).await?;
        Ok(())
    }

    async fn fetch_all(&self) -> TaskStoreResult<Vec<Task>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let tasks: Vec<Task> = serde_json::from_str(&content)?;
        Ok(tasks)
    }
}

/// In-memory storage backend for tests.
///
/// Can be flagged unavailable to exercise storage-failure paths without a
/// filesystem.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    records: RwLock<Vec<Task>>,
    unavailable: AtomicBool,
}

impl MemorySnapshot {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `persist`/`fetch_all` fail as unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> TaskStoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "snapshot storage unavailable",
            )
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MemorySnapshot {
    async fn ensure_initialized(&self) -> TaskStoreResult<()> {
        self.check_available()
    }

    async fn persist(&self, tasks: &[Task]) -> TaskStoreResult<()> {
        self.check_available()?;
        let mut records = self.records.write().await;
        *records = tasks.to_vec();
        Ok(())
    }

    async fn fetch_all(&self) -> TaskStoreResult<Vec<Task>> {
        self.check_available()?;
        let records = self.records.read().await;
        Ok(records.clone())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::TaskStoreError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn memory_store() -> SnapshotTaskStore<MemorySnapshot> {
        SnapshotTaskStore::new(MemorySnapshot::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_ids_strictly_increase_across_removals() {
        let store = memory_store().await;

        let first = store.add("One", "", date(2023, 6, 1)).await.unwrap();
        let second = store.add("Two", "", date(2023, 6, 2)).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        store.remove(second.id).await.unwrap();
        let third = store.add("Three", "", date(2023, 6, 3)).await.unwrap();
        assert_eq!(third.id, 3);

        store.remove(first.id).await.unwrap();
        let fourth = store.add("Four", "", date(2023, 6, 4)).await.unwrap();
        assert_eq!(fourth.id, 4);
    }

    #[tokio::test]
    async fn test_remove_missing_id_is_noop() {
        let store = memory_store().await;
        store.add("One", "", date(2023, 6, 1)).await.unwrap();

        store.remove(42).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_returns_exact_task() {
        let store = memory_store().await;
        let added = store
            .add("Write report", "Quarterly numbers", date(2023, 6, 1))
            .await
            .unwrap();

        let fetched = store.get(added.id).await.unwrap();
        assert_eq!(fetched, Some(added.clone()));

        store.remove(added.id).await.unwrap();
        assert_eq!(store.get(added.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_complete_marks_task_and_ignores_missing() {
        let store = memory_store().await;
        let added = store.add("One", "", date(2023, 6, 1)).await.unwrap();

        store.complete(added.id).await.unwrap();
        assert!(store.get(added.id).await.unwrap().unwrap().completed);

        // Missing id: no error, no effect.
        store.complete(42).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = memory_store().await;
        store.add("One", "", date(2023, 6, 3)).await.unwrap();
        store.add("Two", "", date(2023, 6, 1)).await.unwrap();
        store.add("Three", "", date(2023, 6, 2)).await.unwrap();

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.title)
            .collect();
        assert_eq!(titles, ["One", "Two", "Three"]);
    }

    #[tokio::test]
    async fn test_overdue_excludes_completed() {
        let store = memory_store().await;
        store.add("Past", "", date(2023, 5, 1)).await.unwrap();
        let done = store.add("Done", "", date(2023, 6, 1)).await.unwrap();
        store.add("Future", "", date(2023, 7, 1)).await.unwrap();
        store.complete(done.id).await.unwrap();

        let overdue = store.overdue(date(2023, 6, 15)).await.unwrap();

        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].title, "Past");
    }

    #[tokio::test]
    async fn test_upcoming_includes_completed() {
        let store = memory_store().await;
        store.add("Past", "", date(2023, 5, 1)).await.unwrap();
        let done = store.add("Done", "", date(2023, 6, 1)).await.unwrap();
        store.add("Future", "", date(2023, 7, 1)).await.unwrap();
        store.complete(done.id).await.unwrap();

        let upcoming = store.upcoming(date(2023, 6, 15)).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "Future");

        // A completed task due in the future still counts as upcoming.
        let finished_future = store.add("Finished", "", date(2023, 8, 1)).await.unwrap();
        store.complete(finished_future.id).await.unwrap();

        let upcoming = store.upcoming(date(2023, 6, 15)).await.unwrap();
        let titles: Vec<String> = upcoming.into_iter().map(|task| task.title).collect();
        assert!(titles.contains(&"Finished".to_string()));
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        let store = SnapshotTaskStore::new(JsonSnapshot::new(&path))
            .await
            .unwrap();
        store.add("One", "First", date(2023, 6, 1)).await.unwrap();
        let two = store.add("Two", "Second", date(2023, 7, 1)).await.unwrap();
        store.complete(two.id).await.unwrap();
        store.save().await.unwrap();

        let reloaded = SnapshotTaskStore::new(JsonSnapshot::new(&path))
            .await
            .unwrap();
        reloaded.load().await.unwrap();

        let mut before = store.list().await.unwrap();
        let mut after = reloaded.list().await.unwrap();
        before.sort_by_key(|task| task.id);
        after.sort_by_key(|task| task.id);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_load_resets_id_counter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        let store = SnapshotTaskStore::new(JsonSnapshot::new(&path))
            .await
            .unwrap();
        store.add("One", "", date(2023, 6, 1)).await.unwrap();
        store.add("Two", "", date(2023, 6, 2)).await.unwrap();
        store.save().await.unwrap();

        let reloaded = SnapshotTaskStore::new(JsonSnapshot::new(&path))
            .await
            .unwrap();
        reloaded.load().await.unwrap();
        let next = reloaded.add("Three", "", date(2023, 6, 3)).await.unwrap();
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn test_load_replaces_instead_of_merging() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        let store = SnapshotTaskStore::new(JsonSnapshot::new(&path))
            .await
            .unwrap();
        store.add("Saved", "", date(2023, 6, 1)).await.unwrap();
        store.save().await.unwrap();

        store.add("Unsaved", "", date(2023, 6, 2)).await.unwrap();
        store.load().await.unwrap();

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.title)
            .collect();
        assert_eq!(titles, ["Saved"]);
    }

    #[tokio::test]
    async fn test_load_malformed_record_fails_and_preserves_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        // Record missing due_date.
        std::fs::write(
            &path,
            r#"[{"id":1,"title":"Broken","description":"","completed":false}]"#,
        )
        .unwrap();

        let store = SnapshotTaskStore::new(JsonSnapshot::new(&path))
            .await
            .unwrap();
        let kept = store.add("Kept", "", date(2023, 6, 1)).await.unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, TaskStoreError::Format(_)));

        assert_eq!(store.list().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let store = SnapshotTaskStore::new(JsonSnapshot::new(dir.path().join("absent.json")))
            .await
            .unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, TaskStoreError::Io(_)));
    }

    #[tokio::test]
    async fn test_save_failure_leaves_memory_untouched() {
        let store = memory_store().await;
        store.add("One", "", date(2023, 6, 1)).await.unwrap();

        store.backend.set_unavailable(true);
        let err = store.save().await.unwrap_err();
        assert!(matches!(err, TaskStoreError::Io(_)));

        // In-memory operations are unaffected by the unreachable mirror.
        assert_eq!(store.list().await.unwrap().len(), 1);
        store.add("Two", "", date(2023, 6, 2)).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);
    }
}
