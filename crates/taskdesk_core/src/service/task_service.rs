//! Task lifecycle service.
//!
//! # Responsibility
//! - Hold the in-memory working set loaded from a `TaskStore`.
//! - Validate user input before any persistence attempt.
//! - Route add/complete/delete mutations through the store.
//! - Project filtered, sorted display rows and summary counters.
//!
//! # Invariants
//! - The working set only changes after the matching store write succeeded.
//! - `filtered_view` is a pure function of working set, search text and filter.
//! - Views are sorted by `created_date` descending with a stable sort.
//! - Store errors reach the caller unmodified (apart from `NotFound` and
//!   validation failures, which get their own service variants).

use crate::model::task::{
    RemainingLabel, StatusFilter, Task, TaskDraft, TaskId, TaskValidationError,
};
use crate::repo::task_repo::{RepoError, TaskStore};
use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Source of "now" for creation timestamps and deadline labels.
pub type Clock = Box<dyn Fn() -> NaiveDateTime>;

/// Errors surfaced by lifecycle operations.
#[derive(Debug)]
pub enum ServiceError {
    /// User input broke a task invariant; nothing was persisted.
    Validation(TaskValidationError),
    /// Target task is not in the working set or the store.
    NotFound(TaskId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Store accepted a write but the read-back disagrees.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<TaskValidationError> for ServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Counters over the whole working set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

/// Display row handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDisplay {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub deadline: NaiveDateTime,
    pub created_date: NaiveDateTime,
    pub is_completed: bool,
    pub remaining_label: RemainingLabel,
}

impl TaskDisplay {
    fn from_task(task: &Task, today: NaiveDate) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: task.deadline,
            created_date: task.created_date,
            is_completed: task.is_completed,
            remaining_label: remaining_label(task.deadline, today),
        }
    }
}

/// Lifecycle facade over one owned task store.
pub struct TaskService<S: TaskStore> {
    store: S,
    tasks: Vec<Task>,
    clock: Clock,
}

impl<S: TaskStore> TaskService<S> {
    /// Creates a service on local wall-clock time with an empty working set.
    ///
    /// Call `refresh` (or use `open`) before reading.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, local_now)
    }

    /// Creates a service with an injected clock.
    pub fn with_clock(store: S, clock: impl Fn() -> NaiveDateTime + 'static) -> Self {
        Self {
            store,
            tasks: Vec::new(),
            clock: Box::new(clock),
        }
    }

    /// Creates a service and loads the working set.
    pub fn open(store: S) -> ServiceResult<Self> {
        let mut service = Self::new(store);
        service.refresh()?;
        Ok(service)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current working set in store order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Reloads the working set from the store.
    pub fn refresh(&mut self) -> ServiceResult<()> {
        let tasks = self
            .store
            .list_all()
            .map_err(|err| log_failure("task_refresh", err.into()))?;
        info!(
            "event=task_refresh module=service status=ok backend={} count={}",
            self.store.backend_name(),
            tasks.len()
        );
        self.tasks = tasks;
        Ok(())
    }

    /// Creates a task due at 23:59 on `deadline_date`.
    ///
    /// # Contract
    /// - Title and description are trimmed; a blank title is rejected
    ///   before the store is touched.
    /// - `created_date` is the clock reading at call time.
    /// - Returns the stored record as read back after refresh.
    pub fn add(
        &mut self,
        title: &str,
        description: &str,
        deadline_date: NaiveDate,
    ) -> ServiceResult<Task> {
        let draft = TaskDraft::new(title, description, deadline_date, (self.clock)());
        draft
            .validate()
            .map_err(|err| log_failure("task_add", err.into()))?;

        let id = self
            .store
            .create(&draft)
            .map_err(|err| log_failure("task_add", err.into()))?;
        self.refresh()?;

        let created = self
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or(ServiceError::InconsistentState(
                "created task not found in read-back",
            ))?;
        info!("event=task_add module=service status=ok task_id={id}");
        Ok(created)
    }

    /// Sets the completion flag of one task and writes it through.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not in the working set.
    /// - Store failures leave the in-memory copy untouched.
    pub fn toggle_complete(&mut self, id: TaskId, completed: bool) -> ServiceResult<()> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| log_failure("task_toggle", ServiceError::NotFound(id)))?;

        let mut updated = self.tasks[index].clone();
        updated.is_completed = completed;
        self.store
            .update(&updated)
            .map_err(|err| log_failure("task_toggle", err.into()))?;
        self.tasks[index] = updated;

        info!("event=task_toggle module=service status=ok task_id={id} completed={completed}");
        Ok(())
    }

    /// Removes a task from the store and the working set. Idempotent.
    pub fn delete(&mut self, id: TaskId) -> ServiceResult<()> {
        self.store
            .delete(id)
            .map_err(|err| log_failure("task_delete", err.into()))?;
        self.tasks.retain(|task| task.id != id);
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Filters the working set by title substring and status, newest first.
    ///
    /// Matching is case-insensitive; an empty `search_text` matches all.
    pub fn filtered_view(&self, search_text: &str, status: StatusFilter) -> Vec<&Task> {
        let needle = search_text.to_lowercase();
        let mut view: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| needle.is_empty() || task.title.to_lowercase().contains(&needle))
            .filter(|task| status.matches(task))
            .collect();
        view.sort_by(|left, right| right.created_date.cmp(&left.created_date));
        view
    }

    /// Filtered view projected to display rows with deadline labels.
    pub fn list_all_for_display(
        &self,
        search_text: &str,
        status: StatusFilter,
    ) -> Vec<TaskDisplay> {
        let today = (self.clock)().date();
        self.filtered_view(search_text, status)
            .into_iter()
            .map(|task| TaskDisplay::from_task(task, today))
            .collect()
    }

    /// Presentation entry point for task creation.
    pub fn create_task(
        &mut self,
        title: &str,
        description: &str,
        deadline_date: NaiveDate,
    ) -> ServiceResult<Task> {
        self.add(title, description, deadline_date)
    }

    /// Presentation entry point for the completion checkbox.
    pub fn set_completed(&mut self, id: TaskId, completed: bool) -> ServiceResult<()> {
        self.toggle_complete(id, completed)
    }

    /// Presentation entry point for task removal.
    pub fn remove_task(&mut self, id: TaskId) -> ServiceResult<()> {
        self.delete(id)
    }

    pub fn stats(&self) -> TaskStats {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|task| task.is_completed).count();
        TaskStats {
            total,
            active: total - completed,
            completed,
        }
    }
}

/// Classifies a deadline against `today` by calendar-day distance.
///
/// Time of day is ignored.
pub fn remaining_label(deadline: NaiveDateTime, today: NaiveDate) -> RemainingLabel {
    RemainingLabel::from_days((deadline.date() - today).num_days())
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn log_failure(event: &'static str, err: ServiceError) -> ServiceError {
    match &err {
        ServiceError::Validation(_) | ServiceError::NotFound(_) => {
            warn!("event={event} module=service status=rejected error={err}");
        }
        ServiceError::Repo(_) | ServiceError::InconsistentState(_) => {
            error!("event={event} module=service status=error error={err}");
        }
    }
    err
}

#[cfg(test)]
mod tests {
    use super::remaining_label;
    use crate::model::task::{RemainingLabel, Task};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn remaining_label_ignores_time_of_day() {
        let deadline = date(11).and_hms_opt(0, 1, 0).unwrap();
        assert_eq!(remaining_label(deadline, date(10)), RemainingLabel::DueTomorrow);
    }

    #[test]
    fn remaining_label_counts_far_deadlines() {
        let label = remaining_label(Task::end_of_day(date(30)), date(10));
        assert_eq!(label, RemainingLabel::DaysRemaining(20));
        assert_eq!(label.to_string(), "20 days remaining");
    }
}
