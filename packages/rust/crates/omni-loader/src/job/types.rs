//! Collaborator traits and job state.

use std::sync::Arc;

use crate::key::JobKey;
use crate::resource::{EngineResource, Resource};

use super::{EngineJob, JobReporter};

/// One interested party. Identity is the `Arc` allocation, so the same
/// `Arc` must be used to add and to remove a callback.
pub trait ResourceCallback<R: Resource>: Send + Sync {
    /// The load succeeded. One reference was acquired on the caller's
    /// behalf; the callback owns it and must `release` it when done.
    fn on_resource_ready(&self, resource: EngineResource<R>);

    /// The load failed.
    fn on_load_failed(&self);
}

/// The registry that owns jobs by key.
pub trait EngineJobListener<R: Resource>: Send + Sync {
    /// The job reached success (`Some`) or failure (`None`) and is done.
    fn on_engine_job_complete(&self, key: &JobKey, resource: Option<&EngineResource<R>>);

    /// The job was cancelled; `key` may be reassigned.
    fn on_engine_job_cancelled(&self, job: &EngineJob<R>, key: &JobKey);
}

/// The computation behind a job.
pub trait WorkUnit<R: Resource>: Send + Sync {
    /// Run on a worker thread and report exactly one outcome through `reporter`.
    fn run(self: Arc<Self>, reporter: JobReporter<R>);

    /// Ask the computation to stop at its next cancellation check.
    fn cancel(&self);
}

/// Lifecycle state. Every state but `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Submitted, outcome not yet delivered.
    Running,
    /// Result delivered to callbacks.
    Succeeded,
    /// Failure delivered to callbacks.
    Failed,
    /// Every callback withdrew before an outcome was delivered.
    Cancelled,
}

impl JobState {
    /// Whether no further transition can happen.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Whether an outcome was delivered.
    #[must_use]
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Succeeded => 1,
            Self::Failed => 2,
            Self::Cancelled => 3,
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Succeeded,
            2 => Self::Failed,
            3 => Self::Cancelled,
            _ => Self::Running,
        }
    }
}
