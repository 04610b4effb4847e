//! Stable event names attached to every `tracing` record emitted by the loader.

/// Structured `event` field values.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEvent {
    JobStarted,
    JobRescheduled,
    JobRescheduleDropped,
    JobCancelled,
    JobSucceeded,
    JobFailed,
    LateResourceRecycled,
    LateFailureDropped,
    OutcomeUndeliverable,
    CallbackIgnored,
    ResourceReleased,
    CoordinationStarted,
    CoordinationStopped,
    CoordinationFatal,
    PoolTaskCrashed,
}

impl JobEvent {
    /// Dotted name used as the `event` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JobStarted => "loader.job.started",
            Self::JobRescheduled => "loader.job.rescheduled",
            Self::JobRescheduleDropped => "loader.job.reschedule_dropped",
            Self::JobCancelled => "loader.job.cancelled",
            Self::JobSucceeded => "loader.job.succeeded",
            Self::JobFailed => "loader.job.failed",
            Self::LateResourceRecycled => "loader.job.late_resource_recycled",
            Self::LateFailureDropped => "loader.job.late_failure_dropped",
            Self::OutcomeUndeliverable => "loader.job.outcome_undeliverable",
            Self::CallbackIgnored => "loader.job.callback_ignored",
            Self::ResourceReleased => "loader.resource.released",
            Self::CoordinationStarted => "loader.coordination.started",
            Self::CoordinationStopped => "loader.coordination.stopped",
            Self::CoordinationFatal => "loader.coordination.fatal",
            Self::PoolTaskCrashed => "loader.pool.task_crashed",
        }
    }
}
