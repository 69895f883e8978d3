use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use taskdesk_core::{RepoError, SqliteTaskStore, Task, TaskDraft, TaskStore, TaskValidationError};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn created_at(minute: u32) -> NaiveDateTime {
    date(10).and_hms_opt(9, minute, 0).unwrap()
}

fn draft(title: &str, deadline_day: u32, minute: u32) -> TaskDraft {
    TaskDraft::new(title, "", date(deadline_day), created_at(minute))
}

#[test]
fn create_and_list_preserve_insertion_order() {
    let store = SqliteTaskStore::open_in_memory().unwrap();

    let first = store.create(&draft("Buy milk", 12, 0)).unwrap();
    let second = store.create(&draft("Pay rent", 11, 1)).unwrap();
    assert!(second > first);

    let tasks = store.list_all().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, first);
    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].deadline, Task::end_of_day(date(12)));
    assert_eq!(tasks[0].created_date, created_at(0));
    assert!(!tasks[0].is_completed);
    assert_eq!(tasks[1].id, second);
}

#[test]
fn rows_use_iso_text_and_null_for_empty_description() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let id = store.create(&draft("Buy milk", 12, 0)).unwrap();

    let row: (Option<String>, String, String, i64) = store
        .connection()
        .query_row(
            "SELECT description, deadline, created_date, is_completed FROM tasks WHERE id = ?1;",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    let (description, deadline, created, completed) = row;

    assert_eq!(description, None);
    assert_eq!(deadline, "2024-06-12T23:59:00");
    assert_eq!(created, "2024-06-10T09:00:00");
    assert_eq!(completed, 0);
}

#[test]
fn update_replaces_fields_but_keeps_created_date() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let id = store.create(&draft("Buy milk", 12, 0)).unwrap();

    let mut task = store.list_all().unwrap().remove(0);
    task.is_completed = true;
    task.created_date = created_at(45);
    store.update(&task).unwrap();

    let loaded = store.list_all().unwrap().remove(0);
    assert_eq!(loaded.id, id);
    assert!(loaded.is_completed);
    assert_eq!(loaded.created_date, created_at(0));
}

#[test]
fn update_missing_task_returns_not_found() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let ghost = Task::from_draft(99, &draft("Ghost", 12, 0));

    let err = store.update(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(99)));
}

#[test]
fn delete_is_idempotent() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let keep = store.create(&draft("Keep", 12, 0)).unwrap();
    let gone = store.create(&draft("Gone", 12, 1)).unwrap();

    store.delete(gone).unwrap();
    store.delete(gone).unwrap();
    store.delete(12_345).unwrap();

    let ids: Vec<i64> = store.list_all().unwrap().iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![keep]);
}

#[test]
fn ids_are_never_reused_after_delete() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let first = store.create(&draft("First", 12, 0)).unwrap();
    let second = store.create(&draft("Second", 12, 1)).unwrap();
    store.delete(second).unwrap();

    let third = store.create(&draft("Third", 12, 2)).unwrap();
    assert!(third > second);
    assert_ne!(third, first);
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let store = SqliteTaskStore::open_in_memory().unwrap();

    let blank = draft("   ", 12, 0);
    let create_err = store.create(&blank).unwrap_err();
    assert!(matches!(
        create_err,
        RepoError::Validation(TaskValidationError::EmptyTitle)
    ));
    assert!(store.list_all().unwrap().is_empty());

    store.create(&draft("Valid", 12, 0)).unwrap();
    let mut task = store.list_all().unwrap().remove(0);
    task.deadline = date(12).and_hms_opt(8, 0, 0).unwrap();
    let update_err = store.update(&task).unwrap_err();
    assert!(matches!(
        update_err,
        RepoError::Validation(TaskValidationError::DeadlineNotEndOfDay(_))
    ));
}

#[test]
fn list_rejects_invalid_persisted_rows() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    store
        .connection()
        .execute(
            "INSERT INTO tasks (title, description, deadline, created_date, is_completed)
             VALUES ('Broken', NULL, 'next friday', '2024-06-10T09:00:00', 0);",
            [],
        )
        .unwrap();

    let err = store.list_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("tasks.deadline")));
}

#[test]
fn list_rejects_rows_with_deadline_outside_end_of_day() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    store
        .connection()
        .execute(
            "INSERT INTO tasks (title, description, deadline, created_date, is_completed)
             VALUES ('Noon', NULL, '2024-06-12T12:00:00', '2024-06-10T09:00:00', 0);",
            [],
        )
        .unwrap();

    let err = store.list_all().unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::DeadlineNotEndOfDay(_))
    ));
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteTaskStore::try_new(conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("tasks")));
}

#[test]
fn tasks_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.sqlite3");

    let id = {
        let store = SqliteTaskStore::open(&path).unwrap();
        let id = store.create(&draft("Persist me", 12, 0)).unwrap();
        let mut task = store.list_all().unwrap().remove(0);
        task.is_completed = true;
        store.update(&task).unwrap();
        id
    };

    let reopened = SqliteTaskStore::open(&path).unwrap();
    let tasks = reopened.list_all().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, id);
    assert_eq!(tasks[0].title, "Persist me");
    assert!(tasks[0].is_completed);
    assert_eq!(reopened.backend_name(), "sqlite");
}
