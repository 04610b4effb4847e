//! Error types for load job coordination.
//!
//! Follows ODF-EP: Explicit error enums with context.

use thiserror::Error;

use crate::key::JobKey;

/// Loader-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// A listener-facing operation ran off the coordination thread.
    #[error("{operation} must be called on the coordination thread")]
    NotOnCoordinationThread {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The coordination thread stopped accepting messages.
    #[error("coordination thread is not running")]
    CoordinationClosed,

    /// The coordination thread could not be spawned.
    #[error("failed to spawn coordination thread: {0}")]
    CoordinationSpawn(String),

    /// An outcome reached a job with no callbacks that was never cancelled.
    ///
    /// The registry and the job have desynchronized; this is fatal.
    #[error("received a {outcome} for job {key} without any callbacks to notify")]
    NoCallbacks {
        /// Key of the offending job.
        key: JobKey,
        /// `"resource"` or `"failure"`.
        outcome: &'static str,
    },

    /// `acquire` on a handle whose count already reached zero.
    #[error("cannot acquire a released resource")]
    ResourceReleased,

    /// `release` on a handle that holds no references.
    #[error("cannot release a resource that is not acquired")]
    ResourceNotAcquired,

    /// `start` was called twice on the same job.
    #[error("job {0} was already started")]
    AlreadyStarted(JobKey),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;
