//! Core domain logic for taskdesk.
//! This crate is the single source of truth for task invariants; any
//! presentation layer drives it through `TaskService`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{
    open_store, AppConfig, ConfigError, LoggingConfig, StorageBackend, StorageConfig,
};
pub use logging::{
    default_log_level, init_logging, logging_status, LogLevel, LoggingError, LoggingStatus,
};
pub use model::task::{
    ParseStatusFilterError, RemainingLabel, StatusFilter, Task, TaskDraft, TaskId,
    TaskValidationError,
};
pub use repo::json_store::JsonFileTaskStore;
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskStore, TaskStore};
pub use service::task_service::{
    remaining_label, Clock, ServiceError, ServiceResult, TaskDisplay, TaskService, TaskStats,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
