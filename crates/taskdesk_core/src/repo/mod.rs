//! Task store abstraction and its persistence backends.
//!
//! # Responsibility
//! - Define the durable CRUD contract used by the lifecycle service.
//! - Isolate SQLite and JSON file details from service orchestration.
//!
//! # Invariants
//! - Store writes enforce task validation before persistence.
//! - Store failures surface as typed `RepoError`s; nothing is swallowed.

pub mod json_store;
pub mod task_repo;
