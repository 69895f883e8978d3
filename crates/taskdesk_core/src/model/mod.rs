//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by store and service layers.
//! - Own field-level invariants that every persistence backend relies on.
//!
//! # Invariants
//! - Every stored task is identified by a positive, never-reused `TaskId`.
//! - Deadlines are pinned to 23:59 of their calendar date.

pub mod task;
