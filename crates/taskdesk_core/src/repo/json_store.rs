//! Flat-file JSON task store.
//!
//! # Responsibility
//! - Persist the whole task collection as one pretty-printed JSON array.
//! - Assign timestamp-derived ids that stay unique across live tasks.
//!
//! # Invariants
//! - A missing or empty file is an empty store.
//! - Every mutation rewrites the whole file via temp file + rename, so a
//!   failed write never leaves a truncated file behind.
//! - Loaded records are validated; duplicate ids are rejected.

use crate::model::task::{Task, TaskDraft, TaskId};
use crate::repo::task_repo::{RepoError, RepoResult, TaskStore};
use chrono::Utc;
use log::{debug, error};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// JSON-file-backed task store.
///
/// Ids are integers; files with fractional (float-second) ids are rejected
/// as `RepoError::Json`.
#[derive(Debug, Clone)]
pub struct JsonFileTaskStore {
    path: PathBuf,
}

impl JsonFileTaskStore {
    /// Creates a store over `path`. The file is not touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> RepoResult<Vec<Task>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                error!(
                    "event=task_file_read module=repo backend=json status=error error_code=read_failed error={err}"
                );
                return Err(err.into());
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = serde_json::from_str(&content).map_err(|err| {
            error!(
                "event=task_file_read module=repo backend=json status=error error_code=parse_failed error={err}"
            );
            RepoError::from(err)
        })?;

        let mut seen = HashSet::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            task.validate().map_err(|err| {
                RepoError::InvalidData(format!("task at index {index} in task file: {err}"))
            })?;
            if !seen.insert(task.id) {
                return Err(RepoError::InvalidData(format!(
                    "duplicate task id {} in task file",
                    task.id
                )));
            }
        }

        Ok(tasks)
    }

    fn save(&self, tasks: &[Task]) -> RepoResult<()> {
        self.write_atomically(tasks).map_err(|err| {
            error!(
                "event=task_file_write module=repo backend=json status=error error_code=write_failed error={err}"
            );
            RepoError::Io(err)
        })?;
        debug!(
            "event=task_file_write module=repo backend=json status=ok count={}",
            tasks.len()
        );
        Ok(())
    }

    fn write_atomically(&self, tasks: &[Task]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut file, tasks).map_err(io::Error::from)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl TaskStore for JsonFileTaskStore {
    fn create(&self, draft: &TaskDraft) -> RepoResult<TaskId> {
        draft.validate()?;

        let mut tasks = self.load()?;
        let id = next_id(&tasks, Utc::now().timestamp_micros())?;
        tasks.push(Task::from_draft(id, draft));
        self.save(&tasks)?;

        debug!("event=task_create module=repo backend=json status=ok task_id={id}");
        Ok(id)
    }

    fn list_all(&self) -> RepoResult<Vec<Task>> {
        self.load()
    }

    fn update(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let mut tasks = self.load()?;
        let stored = tasks
            .iter_mut()
            .find(|stored| stored.id == task.id)
            .ok_or(RepoError::NotFound(task.id))?;

        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.deadline = task.deadline;
        stored.is_completed = task.is_completed;
        self.save(&tasks)?;

        debug!(
            "event=task_update module=repo backend=json status=ok task_id={}",
            task.id
        );
        Ok(())
    }

    fn delete(&self, id: TaskId) -> RepoResult<()> {
        let mut tasks = self.load()?;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);

        if tasks.len() == before {
            debug!("event=task_delete module=repo backend=json status=ok task_id={id} removed=0");
            return Ok(());
        }

        self.save(&tasks)?;
        debug!("event=task_delete module=repo backend=json status=ok task_id={id} removed=1");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}

/// Picks `candidate` unless an existing id already reaches it.
///
/// Fails instead of wrapping when the largest stored id is `i64::MAX`.
fn next_id(tasks: &[Task], candidate: TaskId) -> RepoResult<TaskId> {
    let max_existing = tasks.iter().map(|task| task.id).max().unwrap_or(0);
    if candidate > max_existing {
        return Ok(candidate);
    }
    max_existing
        .checked_add(1)
        .ok_or_else(|| RepoError::InvalidData("task id space exhausted".to_string()))
}
