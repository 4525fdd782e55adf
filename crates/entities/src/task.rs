//! Task entity definitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single to-do item: identity, descriptive fields, a calendar due date
/// and a completion flag.
///
/// Serializes with exactly the keys `id`, `title`, `description`,
/// `due_date` and `completed`; the due date is the ISO `YYYY-MM-DD` form
/// with no time component. A record missing a required key or carrying a
/// mistyped value fails deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier within a store.
    pub id: i64,
    /// Short title. Non-empty by convention, not enforced.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Calendar due date.
    pub due_date: NaiveDate,
    /// Whether the task has been completed.
    pub completed: bool,
}

impl Task {
    /// Creates a new task. `completed` starts false.
    pub fn new(
        id: i64,
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            due_date,
            completed: false,
        }
    }

    /// Marks the task as completed. Idempotent.
    pub fn mark_as_completed(&mut self) {
        self.completed = true;
    }

    /// True when the due date is strictly before `today` and the task is
    /// not completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date < today && !self.completed
    }

    /// True when the due date is on or after `today`. Completion is not
    /// considered: a finished task due in the future is still upcoming.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.due_date >= today
    }
}
