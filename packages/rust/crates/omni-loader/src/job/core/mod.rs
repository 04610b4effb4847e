//! Job coordinator: callback registry, terminal state and outcome fan-out.

mod callbacks;
mod cancel;
mod delivery;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::coordination::CoordinationHandle;
use crate::error::{LoaderError, Result};
use crate::executor::{Executor, TaskHandle};
use crate::key::JobKey;
use crate::observability::JobEvent;
use crate::resource::{EngineResource, EngineResourceFactory, Resource};

use self::callbacks::CallbackRegistry;
use super::{EngineJobListener, JobReporter, JobState, WorkUnit};

/// Coordinates one load.
///
/// The callback registry is only touched on the coordination thread; the
/// state word and the tracked task are also touched by workers.
pub struct EngineJob<R: Resource> {
    id: u64,
    key: JobKey,
    is_cacheable: bool,
    disk_cache_executor: Arc<dyn Executor>,
    source_executor: Arc<dyn Executor>,
    coordination: CoordinationHandle,
    listener: Arc<dyn EngineJobListener<R>>,
    resource_factory: Arc<dyn EngineResourceFactory<R>>,
    state: AtomicU8,
    callbacks: Mutex<CallbackRegistry<R>>,
    pending_resource: Mutex<Option<R>>,
    engine_resource: OnceLock<EngineResource<R>>,
    work: Mutex<WorkSlot<R>>,
}

struct WorkSlot<R: Resource> {
    started: bool,
    unit: Option<Arc<dyn WorkUnit<R>>>,
    task: Option<Box<dyn TaskHandle>>,
}

pub(crate) struct JobParts<R: Resource> {
    pub(crate) id: u64,
    pub(crate) key: JobKey,
    pub(crate) is_cacheable: bool,
    pub(crate) disk_cache_executor: Arc<dyn Executor>,
    pub(crate) source_executor: Arc<dyn Executor>,
    pub(crate) coordination: CoordinationHandle,
    pub(crate) listener: Arc<dyn EngineJobListener<R>>,
    pub(crate) resource_factory: Arc<dyn EngineResourceFactory<R>>,
}

impl<R: Resource> EngineJob<R> {
    pub(crate) fn new(parts: JobParts<R>) -> Self {
        Self {
            id: parts.id,
            key: parts.key,
            is_cacheable: parts.is_cacheable,
            disk_cache_executor: parts.disk_cache_executor,
            source_executor: parts.source_executor,
            coordination: parts.coordination,
            listener: parts.listener,
            resource_factory: parts.resource_factory,
            state: AtomicU8::new(JobState::Running.as_u8()),
            callbacks: Mutex::new(CallbackRegistry::default()),
            pending_resource: Mutex::new(None),
            engine_resource: OnceLock::new(),
            work: Mutex::new(WorkSlot {
                started: false,
                unit: None,
                task: None,
            }),
        }
    }

    /// Submit `unit` to the disk-cache pool. May be called once.
    ///
    /// Register the first callback in the same coordination-thread turn, so
    /// no outcome can be delivered to an empty registry.
    pub fn start(self: &Arc<Self>, unit: Arc<dyn WorkUnit<R>>) -> Result<()> {
        {
            let mut work = self.lock_work();
            if work.started {
                return Err(LoaderError::AlreadyStarted(self.key.clone()));
            }
            work.started = true;
            work.unit = Some(Arc::clone(&unit));
        }

        let reporter = JobReporter::new(Arc::clone(self));
        let task = self
            .disk_cache_executor
            .submit(Box::new(move || unit.run(reporter)));
        self.track_task(task);

        tracing::debug!(
            event = JobEvent::JobStarted.as_str(),
            key = %self.key,
            job_id = self.id,
            cacheable = self.is_cacheable,
            "load job started"
        );
        Ok(())
    }

    /// Unique id among jobs built by the same factory.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request key.
    #[must_use]
    pub fn key(&self) -> &JobKey {
        &self.key
    }

    /// Whether a successful result may be memory-cached.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.is_cacheable
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether the job was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state() == JobState::Cancelled
    }

    /// Callbacks waiting for the outcome.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.lock_callbacks().len()
    }

    /// The delivered handle, once the job succeeded.
    #[must_use]
    pub fn resource(&self) -> Option<EngineResource<R>> {
        self.engine_resource.get().cloned()
    }

    /// Move from `Running` to `next`. Only the first terminal transition wins.
    fn transition(&self, next: JobState) -> bool {
        self.state
            .compare_exchange(
                JobState::Running.as_u8(),
                next.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Remember the outstanding task; cancel it right away if a cancel
    /// raced ahead of the store.
    fn track_task(&self, task: Box<dyn TaskHandle>) {
        self.lock_work().task = Some(task);
        if self.is_cancelled() {
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
        }
    }

    fn lock_callbacks(&self) -> MutexGuard<'_, CallbackRegistry<R>> {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_work(&self) -> MutexGuard<'_, WorkSlot<R>> {
        self.work.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending_resource(&self) -> MutexGuard<'_, Option<R>> {
        self.pending_resource
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Resource> std::fmt::Debug for EngineJob<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineJob")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("is_cacheable", &self.is_cacheable)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
