//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate task store calls into lifecycle-level APIs.
//! - Keep presentation callers decoupled from storage details.

pub mod task_service;
