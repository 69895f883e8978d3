//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable CRUD over task records behind one backend-neutral trait.
//! - Keep SQL details inside the relational persistence boundary.
//!
//! # Invariants
//! - Write paths validate records before any SQL mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - `update` never rewrites `created_date`.
//! - `delete` of an unknown id is a no-op.

use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::task::{Task, TaskDraft, TaskId, TaskValidationError};
use chrono::NaiveDateTime;
use log::debug;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    deadline,
    created_date,
    is_completed
FROM tasks";

/// ISO-8601 local date-time; fractional seconds only when non-zero.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level error shared by every task store backend.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    Io(std::io::Error),
    Json(serde_json::Error),
    NotFound(TaskId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "task file i/o error: {err}"),
            Self::Json(err) => write!(f, "task file is not valid json: {err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "task database is missing table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "task database table `{table}` is missing column `{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Durable CRUD contract for task records.
///
/// Backends are interchangeable; the lifecycle service only sees this trait.
pub trait TaskStore {
    /// Persists a new task and returns its assigned id.
    fn create(&self, draft: &TaskDraft) -> RepoResult<TaskId>;
    /// Returns every stored task in insertion order.
    fn list_all(&self) -> RepoResult<Vec<Task>>;
    /// Replaces the stored record with the same id.
    ///
    /// Returns `RepoError::NotFound` when no such record exists.
    fn update(&self, task: &Task) -> RepoResult<()>;
    /// Removes the record with `id`; unknown ids are a no-op.
    fn delete(&self, id: TaskId) -> RepoResult<()>;
    /// Short backend name used in diagnostics.
    fn backend_name(&self) -> &'static str;
}

impl<S: TaskStore + ?Sized> TaskStore for Box<S> {
    fn create(&self, draft: &TaskDraft) -> RepoResult<TaskId> {
        (**self).create(draft)
    }

    fn list_all(&self) -> RepoResult<Vec<Task>> {
        (**self).list_all()
    }

    fn update(&self, task: &Task) -> RepoResult<()> {
        (**self).update(task)
    }

    fn delete(&self, id: TaskId) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// SQLite-backed task store owning its connection.
pub struct SqliteTaskStore {
    conn: Connection,
}

impl SqliteTaskStore {
    /// Opens (creating if needed) a database file and migrates it.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Wraps an already-migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   was not created by this crate's migrations.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_task_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Borrows the underlying connection for diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TaskStore for SqliteTaskStore {
    fn create(&self, draft: &TaskDraft) -> RepoResult<TaskId> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                title,
                description,
                deadline,
                created_date,
                is_completed
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                draft.title.as_str(),
                description_to_db(&draft.description),
                datetime_to_db(draft.deadline),
                datetime_to_db(draft.created_date),
                bool_to_int(draft.is_completed),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("event=task_create module=repo backend=sqlite status=ok task_id={id}");
        Ok(id)
    }

    fn list_all(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn update(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                deadline = ?3,
                is_completed = ?4
             WHERE id = ?5;",
            params![
                task.title.as_str(),
                description_to_db(&task.description),
                datetime_to_db(task.deadline),
                bool_to_int(task.is_completed),
                task.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        debug!(
            "event=task_update module=repo backend=sqlite status=ok task_id={}",
            task.id
        );
        Ok(())
    }

    fn delete(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        debug!(
            "event=task_delete module=repo backend=sqlite status=ok task_id={id} removed={changed}"
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let deadline_text: String = row.get("deadline")?;
    let created_text: String = row.get("created_date")?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed"
            )));
        }
    };

    let task = Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row
            .get::<_, Option<String>>("description")?
            .unwrap_or_default(),
        deadline: parse_datetime(&deadline_text, "tasks.deadline")?,
        created_date: parse_datetime(&created_text, "tasks.created_date")?,
        is_completed,
    };
    task.validate()?;
    Ok(task)
}

fn datetime_to_db(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(value: &str, column: &str) -> RepoResult<NaiveDateTime> {
    value
        .parse::<NaiveDateTime>()
        .map_err(|_| RepoError::InvalidData(format!("invalid date-time `{value}` in {column}")))
}

fn description_to_db(description: &str) -> Option<&str> {
    if description.is_empty() {
        None
    } else {
        Some(description)
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_task_connection_ready(conn: &Connection) -> RepoResult<()> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    if version > latest_version() {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: latest_version(),
        }
        .into());
    }

    if !table_exists(conn, "tasks")? {
        return Err(RepoError::MissingRequiredTable("tasks"));
    }

    for column in [
        "id",
        "title",
        "description",
        "deadline",
        "created_date",
        "is_completed",
    ] {
        if !table_has_column(conn, "tasks", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "tasks",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{datetime_to_db, parse_datetime, RepoError};
    use chrono::NaiveDate;

    #[test]
    fn datetime_round_trips_through_db_text() {
        let value = NaiveDate::from_ymd_opt(2024, 6, 12)
            .unwrap()
            .and_hms_micro_opt(23, 59, 0, 0)
            .unwrap();
        let text = datetime_to_db(value);
        assert_eq!(text, "2024-06-12T23:59:00");
        assert_eq!(parse_datetime(&text, "tasks.deadline").unwrap(), value);
    }

    #[test]
    fn datetime_keeps_fractional_seconds() {
        let value = NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_micro_opt(9, 30, 15, 123_456)
            .unwrap();
        let text = datetime_to_db(value);
        assert!(text.starts_with("2024-06-10T09:30:15."));
        assert_eq!(parse_datetime(&text, "tasks.created_date").unwrap(), value);
    }

    #[test]
    fn parse_datetime_rejects_garbage() {
        let err = parse_datetime("tomorrow", "tasks.deadline").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("tomorrow")));
    }
}
