//! Bounded worker pool on top of a tokio runtime.
//!
//! Each submission is an async dispatcher task that waits for a permit and
//! then runs the work on the blocking thread pool. Cancellation aborts the
//! dispatcher (so queued work never starts) and the blocking task (which
//! only has an effect before it began running).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;

use super::{Executor, Task, TaskHandle};
use crate::config::PoolConfig;
use crate::observability::JobEvent;

/// Runs at most `max_in_flight` tasks at once on a tokio runtime.
pub struct WorkerPool {
    name: Arc<str>,
    runtime: Handle,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    submitted: AtomicU64,
}

impl WorkerPool {
    /// Create a pool that spawns onto `runtime`.
    pub fn new(runtime: Handle, config: &PoolConfig) -> Self {
        let max_in_flight = config.max_in_flight.max(1);
        Self {
            name: Arc::from(config.name.as_str()),
            runtime,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            submitted: AtomicU64::new(0),
        }
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured concurrency limit.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Permits not currently held by running tasks.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Total number of submissions so far.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }
}

impl Executor for WorkerPool {
    fn submit(&self, task: Task) -> Box<dyn TaskHandle> {
        let seq = self.submitted.fetch_add(1, Ordering::Relaxed);
        let permits = Arc::clone(&self.permits);
        let pool = Arc::clone(&self.name);
        let blocking = Arc::new(OnceLock::<AbortHandle>::new());
        let blocking_slot = Arc::clone(&blocking);

        let dispatcher = self.runtime.spawn(async move {
            let Ok(permit) = permits.acquire_owned().await else {
                return;
            };
            let worker = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                task();
            });
            let _ = blocking_slot.set(worker.abort_handle());
            if let Err(error) = worker.await
                && error.is_panic()
            {
                tracing::error!(
                    event = JobEvent::PoolTaskCrashed.as_str(),
                    pool = %pool,
                    seq,
                    "worker task crashed: {error}"
                );
            }
        });

        Box::new(PoolTaskHandle {
            dispatcher: dispatcher.abort_handle(),
            blocking,
        })
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("max_in_flight", &self.max_in_flight)
            .field("available_permits", &self.available_permits())
            .finish_non_exhaustive()
    }
}

struct PoolTaskHandle {
    dispatcher: AbortHandle,
    blocking: Arc<OnceLock<AbortHandle>>,
}

impl TaskHandle for PoolTaskHandle {
    fn cancel(&self) {
        self.dispatcher.abort();
        if let Some(blocking) = self.blocking.get() {
            blocking.abort();
        }
    }

    fn is_finished(&self) -> bool {
        match self.blocking.get() {
            Some(blocking) => blocking.is_finished(),
            None => self.dispatcher.is_finished(),
        }
    }
}
