//! Builds jobs that share executors, a coordination thread and a registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coordination::CoordinationHandle;
use crate::executor::Executor;
use crate::key::JobKey;
use crate::resource::{DefaultEngineResourceFactory, EngineResourceFactory, Resource};

use super::EngineJobListener;
use super::core::{EngineJob, JobParts};

/// Creates [`EngineJob`]s wired to one set of collaborators.
pub struct EngineJobFactory<R: Resource> {
    disk_cache_executor: Arc<dyn Executor>,
    source_executor: Arc<dyn Executor>,
    coordination: CoordinationHandle,
    listener: Arc<dyn EngineJobListener<R>>,
    resource_factory: Arc<dyn EngineResourceFactory<R>>,
    next_job_seq: AtomicU64,
}

impl<R: Resource> EngineJobFactory<R> {
    /// Jobs start on `disk_cache_executor` and reschedule onto
    /// `source_executor`.
    pub fn new(
        disk_cache_executor: Arc<dyn Executor>,
        source_executor: Arc<dyn Executor>,
        coordination: CoordinationHandle,
        listener: Arc<dyn EngineJobListener<R>>,
    ) -> Self {
        Self {
            disk_cache_executor,
            source_executor,
            coordination,
            listener,
            resource_factory: Arc::new(DefaultEngineResourceFactory),
            next_job_seq: AtomicU64::new(0),
        }
    }

    /// Replace the handle factory used by every job built afterwards.
    #[must_use]
    pub fn with_resource_factory(mut self, factory: Arc<dyn EngineResourceFactory<R>>) -> Self {
        self.resource_factory = factory;
        self
    }

    /// Coordination handle jobs deliver on.
    #[must_use]
    pub fn coordination(&self) -> &CoordinationHandle {
        &self.coordination
    }

    /// Build a job for `key`. The job is not started.
    pub fn build(&self, key: impl Into<JobKey>, is_cacheable: bool) -> Arc<EngineJob<R>> {
        let id = self.next_job_seq.fetch_add(1, Ordering::Relaxed);
        Arc::new(EngineJob::new(JobParts {
            id,
            key: key.into(),
            is_cacheable,
            disk_cache_executor: Arc::clone(&self.disk_cache_executor),
            source_executor: Arc::clone(&self.source_executor),
            coordination: self.coordination.clone(),
            listener: Arc::clone(&self.listener),
            resource_factory: Arc::clone(&self.resource_factory),
        }))
    }
}

impl<R: Resource> std::fmt::Debug for EngineJobFactory<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineJobFactory")
            .field("coordination", &self.coordination)
            .field("built", &self.next_job_seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
