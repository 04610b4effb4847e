//! Cancellation and rescheduling.

use std::sync::Arc;

use crate::job::{JobReporter, JobState, WorkUnit};
use crate::observability::JobEvent;
use crate::resource::Resource;

use super::EngineJob;

impl<R: Resource> EngineJob<R> {
    /// Cancel the job unless it already reached a terminal state.
    ///
    /// Cooperative for the work unit, forceful for the pool task. A result
    /// that still arrives afterwards is recycled, never delivered.
    pub fn cancel(&self) {
        if !self.transition(JobState::Cancelled) {
            return;
        }

        let (unit, task) = {
            let mut work = self.lock_work();
            (work.unit.clone(), work.task.take())
        };
        if let Some(unit) = unit {
            unit.cancel();
        }
        if let Some(task) = task {
            task.cancel();
        }

        tracing::debug!(
            event = JobEvent::JobCancelled.as_str(),
            key = %self.key,
            job_id = self.id,
            "load job cancelled"
        );
        self.listener.on_engine_job_cancelled(self, &self.key);
    }

    /// Continue on the source pool with `unit`. Callback-visible state is
    /// left untouched.
    pub(crate) fn reschedule(self: &Arc<Self>, unit: Arc<dyn WorkUnit<R>>) {
        if self.is_cancelled() {
            tracing::debug!(
                event = JobEvent::JobRescheduleDropped.as_str(),
                key = %self.key,
                job_id = self.id,
                "not rescheduling a cancelled job"
            );
            return;
        }

        self.lock_work().unit = Some(Arc::clone(&unit));
        let reporter = JobReporter::new(Arc::clone(self));
        let task = self
            .source_executor
            .submit(Box::new(move || unit.run(reporter)));
        self.track_task(task);

        tracing::debug!(
            event = JobEvent::JobRescheduled.as_str(),
            key = %self.key,
            job_id = self.id,
            "load job moved to source pool"
        );
    }
}
