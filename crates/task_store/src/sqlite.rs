//! SQLite-backed task store.

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use entities::Task;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, Pool, Sqlite};
use tracing::info;

use crate::{TaskStore, TaskStoreResult};

/// SQL schema definition
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    due_date TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0
);
"#;

/// Database row for Task
#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    due_date: NaiveDate,
    completed: bool,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            completed: row.completed,
        }
    }
}

/// Task store backed by a single SQLite table.
///
/// The table is the source of truth: every operation round-trips to
/// storage and commits on its own, with no transaction spanning multiple
/// calls. Identifiers come from the table's AUTOINCREMENT primary key and
/// are never reused after deletion. Because reads always hit the table,
/// out-of-band writes by other connections are observed on the next call;
/// no locking or versioning is provided to detect them.
///
/// Due dates are stored as zero-padded ISO `YYYY-MM-DD` text, so the
/// classification queries can compare them as strings: lexicographic order
/// and chronological order coincide.
pub struct SqliteTaskStore {
    pool: Pool<Sqlite>,
}

impl SqliteTaskStore {
    /// Opens (creating if necessary) the database at `db_path` and ensures
    /// the tasks table exists. Safe to call on an existing database; never
    /// alters existing rows.
    pub async fn open(db_path: &Path) -> TaskStoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Opens an in-memory database, for tests.
    pub async fn in_memory() -> TaskStoreResult<Self> {
        // A second connection would see a different empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Runs the idempotent schema migration.
    async fn run_migrations(&self) -> TaskStoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        info!("tasks table ready");
        Ok(())
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn add(
        &self,
        title: &str,
        description: &str,
        due_date: NaiveDate,
    ) -> TaskStoreResult<Task> {
        let result = sqlx::query(
            "INSERT INTO tasks (title, description, due_date, completed) VALUES (?, ?, ?, 0)",
        )
        .bind(title)
        .bind(description)
        .bind(due_date)
        .execute(&self.pool)
        .await?;

        Ok(Task::new(
            result.last_insert_rowid(),
            title,
            description,
            due_date,
        ))
    }

    async fn remove(&self, id: i64) -> TaskStoreResult<()> {
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, id: i64) -> TaskStoreResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT id, title, description, due_date, completed FROM tasks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn complete(&self, id: i64) -> TaskStoreResult<()> {
        sqlx::query("UPDATE tasks SET completed = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> TaskStoreResult<Vec<Task>> {
        let rows: Vec<TaskRow> =
            sqlx::query_as("SELECT id, title, description, due_date, completed FROM tasks")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn overdue(&self, today: NaiveDate) -> TaskStoreResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, title, description, due_date, completed FROM tasks \
             WHERE due_date < ? AND completed = 0",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upcoming(&self, today: NaiveDate) -> TaskStoreResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, title, description, due_date, completed FROM tasks \
             WHERE due_date >= ?",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn save(&self) -> TaskStoreResult<()> {
        // Every mutation already committed; nothing staged to write.
        Ok(())
    }

    async fn load(&self) -> TaskStoreResult<()> {
        // Every read already goes to the table; nothing cached to refresh.
        Ok(())
    }
}
