//! Domain errors for the orchestrator.
//!
//! Variants are tagged by which of the four error kinds they represent
//! (precondition, transient-external, observability-only, cancellation) so
//! callers can decide how to react without string-matching messages.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur while operating the orchestrator.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Caller bug: duplicate worker registration for a task already in the pool.
    #[error("worker already exists for task {0}")]
    WorkerAlreadyExists(String),

    /// Caller bug: pool already holds `maxWorkers` entries.
    #[error("worker pool at capacity ({0} workers)")]
    PoolAtCapacity(usize),

    /// Caller bug: operation referenced a worker that isn't registered.
    #[error("worker not found for task {0}")]
    WorkerNotFound(String),

    /// Caller bug: referenced an unknown trigger.
    #[error("trigger not found: {0}")]
    TriggerNotFound(Uuid),

    /// Caller bug: trigger condition used an operator the evaluator doesn't know.
    #[error("invalid threshold operator: {0}")]
    InvalidOperator(String),

    /// Caller bug: an ID failed its required pattern (TASK-*, AUTO-*, path traversal guard, ...).
    #[error("invalid identifier '{0}': {1}")]
    InvalidId(String, &'static str),

    /// Transient-external: the database round-trip failed.
    #[error("database error: {0}")]
    Database(String),

    /// Transient-external: (de)serialization of a stored value failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Transient-external: the task's subprocess could not be spawned or exited abnormally.
    #[error("subprocess error: {0}")]
    Subprocess(String),

    /// Transient-external: the configured TaskCreator failed to create or start a task.
    #[error("task creator error: {0}")]
    TaskCreator(String),

    /// Observability-only: a secondary write (notification, cooldown reset) failed.
    /// Control flow continues; this is surfaced for logging, not propagated as fatal.
    #[error("non-fatal error: {0}")]
    Observability(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for DomainError {
    fn from(err: serde_yaml::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
