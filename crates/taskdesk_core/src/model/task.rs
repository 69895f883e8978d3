//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical `Task` record and its unsaved `TaskDraft` shape.
//! - Provide validation shared by write and read paths of every store.
//! - Define list filter and deadline label vocabularies.
//!
//! # Invariants
//! - `title` is non-empty after trimming.
//! - `deadline` carries hour 23 and minute 59.
//! - `created_date` is assigned once and never rewritten.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Stable task identifier assigned by the store.
pub type TaskId = i64;

static END_OF_DAY: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(23, 59, 0).expect("valid end-of-day time"));

/// Field-level validation failures for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// Persisted id is zero or negative.
    InvalidId(TaskId),
    /// Deadline is not pinned to 23:59.
    DeadlineNotEndOfDay(NaiveDateTime),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::InvalidId(id) => write!(f, "task id must be positive, got {id}"),
            Self::DeadlineNotEndOfDay(deadline) => {
                write!(f, "task deadline must be at 23:59, got {deadline}")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Free text; empty when the user gave none.
    #[serde(default)]
    pub description: String,
    /// Local date-time, always 23:59 of the due date.
    pub deadline: NaiveDateTime,
    /// Local creation instant.
    pub created_date: NaiveDateTime,
    pub is_completed: bool,
}

/// Unsaved task shape handed to `TaskStore::create`.
///
/// The store assigns `id`; everything else is fixed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub deadline: NaiveDateTime,
    pub created_date: NaiveDateTime,
    pub is_completed: bool,
}

impl Task {
    /// Returns 23:59 on `date`, the only deadline shape tasks accept.
    pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
        date.and_time(*END_OF_DAY)
    }

    /// Materializes a stored task from a draft and its assigned id.
    pub fn from_draft(id: TaskId, draft: &TaskDraft) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            deadline: draft.deadline,
            created_date: draft.created_date,
            is_completed: draft.is_completed,
        }
    }

    /// Validates persisted-record invariants.
    ///
    /// # Errors
    /// - `InvalidId` when `id <= 0`.
    /// - `EmptyTitle` / `DeadlineNotEndOfDay` as for drafts.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id <= 0 {
            return Err(TaskValidationError::InvalidId(self.id));
        }
        validate_fields(&self.title, self.deadline)
    }
}

impl TaskDraft {
    /// Builds a fresh, not-yet-completed draft.
    ///
    /// `title` and `description` are trimmed; `deadline` is pinned to 23:59.
    pub fn new(
        title: &str,
        description: &str,
        deadline_date: NaiveDate,
        created_date: NaiveDateTime,
    ) -> Self {
        Self {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            deadline: Task::end_of_day(deadline_date),
            created_date,
            is_completed: false,
        }
    }

    /// Validates draft invariants before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_fields(&self.title, self.deadline)
    }
}

fn validate_fields(title: &str, deadline: NaiveDateTime) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    if deadline.hour() != 23 || deadline.minute() != 59 {
        return Err(TaskValidationError::DeadlineNotEndOfDay(deadline));
    }
    Ok(())
}

/// Completion-status filter applied to list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Every task passes.
    #[default]
    All,
    /// Only tasks with `is_completed == false`.
    Active,
    /// Only tasks with `is_completed == true`.
    Completed,
}

impl StatusFilter {
    /// Returns whether `task` passes this filter.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.is_completed,
            Self::Completed => task.is_completed,
        }
    }

    /// Canonical lowercase name, the inverse of `FromStr`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// Unknown status filter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusFilterError(pub String);

impl Display for ParseStatusFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported status filter `{}`; expected all|active|completed",
            self.0
        )
    }
}

impl Error for ParseStatusFilterError {}

impl FromStr for StatusFilter {
    type Err = ParseStatusFilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(ParseStatusFilterError(other.to_string())),
        }
    }
}

/// Human-readable deadline category for list rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingLabel {
    Overdue,
    DueToday,
    DueTomorrow,
    /// Two or more calendar days left.
    DaysRemaining(i64),
}

impl RemainingLabel {
    /// Classifies a signed calendar-day distance to the deadline.
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => Self::Overdue,
            0 => Self::DueToday,
            1 => Self::DueTomorrow,
            d => Self::DaysRemaining(d),
        }
    }
}

impl Display for RemainingLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overdue => write!(f, "overdue"),
            Self::DueToday => write!(f, "due today"),
            Self::DueTomorrow => write!(f, "due tomorrow"),
            Self::DaysRemaining(days) => write!(f, "{days} days remaining"),
        }
    }
}
