//! Outcome hand-off from workers and fan-out on the coordination thread.

use std::sync::Arc;

use crate::coordination::{CoordinationMessage, OutcomeTarget};
use crate::error::{LoaderError, Result};
use crate::job::JobState;
use crate::key::JobKey;
use crate::observability::JobEvent;
use crate::resource::Resource;

use super::EngineJob;

impl<R: Resource> EngineJob<R> {
    pub(crate) fn on_resource_ready(self: Arc<Self>, resource: R) {
        *self.lock_pending_resource() = Some(resource);
        let target: Arc<dyn OutcomeTarget> = self.clone();
        if let Err(error) = self.coordination.send(CoordinationMessage::Complete(target)) {
            tracing::warn!(
                event = JobEvent::OutcomeUndeliverable.as_str(),
                key = %self.key,
                job_id = self.id,
                error = %error,
                "dropping resource, coordination thread is gone"
            );
            if let Some(resource) = self.lock_pending_resource().take() {
                resource.recycle();
            }
        }
    }

    pub(crate) fn on_load_failed(self: Arc<Self>) {
        let target: Arc<dyn OutcomeTarget> = self.clone();
        if let Err(error) = self.coordination.send(CoordinationMessage::Exception(target)) {
            tracing::warn!(
                event = JobEvent::OutcomeUndeliverable.as_str(),
                key = %self.key,
                job_id = self.id,
                error = %error,
                "dropping failure, coordination thread is gone"
            );
        }
    }

    fn deliver_result(&self) -> Result<()> {
        let Some(resource) = self.lock_pending_resource().take() else {
            return Ok(());
        };

        if self.is_cancelled() {
            tracing::debug!(
                event = JobEvent::LateResourceRecycled.as_str(),
                key = %self.key,
                job_id = self.id,
                "result arrived after cancellation"
            );
            resource.recycle();
            return Ok(());
        }
        if self.lock_callbacks().is_empty() {
            resource.recycle();
            return Err(LoaderError::NoCallbacks {
                key: self.key.clone(),
                outcome: "resource",
            });
        }
        if !self.transition(JobState::Succeeded) {
            resource.recycle();
            return Ok(());
        }

        let engine_resource = self.resource_factory.build(resource, self.is_cacheable);
        let _ = self.engine_resource.set(engine_resource.clone());

        // Held for the whole fan-out so a callback releasing synchronously
        // cannot drop the count to zero.
        engine_resource.acquire()?;
        self.listener
            .on_engine_job_complete(&self.key, Some(&engine_resource));

        let callbacks = self.lock_callbacks().snapshot();
        let mut notified = 0usize;
        for callback in callbacks {
            if self.lock_callbacks().is_ignored(&callback) {
                continue;
            }
            engine_resource.acquire()?;
            callback.on_resource_ready(engine_resource.clone());
            notified += 1;
        }

        tracing::debug!(
            event = JobEvent::JobSucceeded.as_str(),
            key = %self.key,
            job_id = self.id,
            notified,
            "load job succeeded"
        );
        engine_resource.release()
    }

    fn deliver_failure(&self) -> Result<()> {
        if self.is_cancelled() {
            tracing::debug!(
                event = JobEvent::LateFailureDropped.as_str(),
                key = %self.key,
                job_id = self.id,
                "failure arrived after cancellation"
            );
            return Ok(());
        }
        if self.lock_callbacks().is_empty() {
            return Err(LoaderError::NoCallbacks {
                key: self.key.clone(),
                outcome: "failure",
            });
        }
        if !self.transition(JobState::Failed) {
            return Ok(());
        }

        self.listener.on_engine_job_complete(&self.key, None);

        let callbacks = self.lock_callbacks().snapshot();
        let mut notified = 0usize;
        for callback in callbacks {
            if self.lock_callbacks().is_ignored(&callback) {
                continue;
            }
            callback.on_load_failed();
            notified += 1;
        }

        tracing::debug!(
            event = JobEvent::JobFailed.as_str(),
            key = %self.key,
            job_id = self.id,
            notified,
            "load job failed"
        );
        Ok(())
    }
}

impl<R: Resource> OutcomeTarget for EngineJob<R> {
    fn key(&self) -> &JobKey {
        &self.key
    }

    fn handle_result(&self) -> Result<()> {
        self.deliver_result()
    }

    fn handle_failure(&self) -> Result<()> {
        self.deliver_failure()
    }
}
