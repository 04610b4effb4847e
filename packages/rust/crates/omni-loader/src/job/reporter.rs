//! Single-use outcome channel handed to a running work unit.

use std::sync::Arc;

use crate::key::JobKey;
use crate::resource::Resource;

use super::{EngineJob, WorkUnit};

/// Reports the outcome of one run. Each reporting method consumes the
/// reporter, so a run produces at most one outcome.
pub struct JobReporter<R: Resource> {
    job: Arc<EngineJob<R>>,
}

impl<R: Resource> JobReporter<R> {
    pub(crate) fn new(job: Arc<EngineJob<R>>) -> Self {
        Self { job }
    }

    /// Key of the job this run belongs to.
    #[must_use]
    pub fn key(&self) -> &JobKey {
        self.job.key()
    }

    /// Cooperative cancellation check.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.job.is_cancelled()
    }

    /// The work produced `resource`.
    pub fn resource_ready(self, resource: R) {
        self.job.on_resource_ready(resource);
    }

    /// The work failed.
    pub fn load_failed(self) {
        self.job.on_load_failed();
    }

    /// Continue with `unit` on the source pool.
    pub fn reschedule(self, unit: Arc<dyn WorkUnit<R>>) {
        self.job.reschedule(unit);
    }
}

impl<R: Resource> std::fmt::Debug for JobReporter<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobReporter")
            .field("key", self.job.key())
            .field("job_id", &self.job.id())
            .finish()
    }
}
