//! Wires the coordination thread and both worker pools from a [`LoaderConfig`].

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::LoaderConfig;
use crate::coordination::{CoordinationHandle, CoordinationThread};
use crate::error::Result;
use crate::executor::WorkerPool;
use crate::job::{EngineJobFactory, EngineJobListener};
use crate::resource::Resource;

/// Long-lived loader infrastructure shared by every job.
pub struct LoaderRuntime {
    coordination: CoordinationThread,
    disk_cache_pool: Arc<WorkerPool>,
    source_pool: Arc<WorkerPool>,
}

impl LoaderRuntime {
    /// Spawn the coordination thread and create pools on `runtime`.
    pub fn start(config: LoaderConfig, runtime: &Handle) -> Result<Self> {
        let config = config.normalized();
        let coordination = CoordinationThread::spawn(&config.coordination_thread_name)?;
        let disk_cache_pool = Arc::new(WorkerPool::new(runtime.clone(), &config.disk_cache_pool));
        let source_pool = Arc::new(WorkerPool::new(runtime.clone(), &config.source_pool));

        tracing::info!(
            coordination_thread = %config.coordination_thread_name,
            disk_cache_pool = %config.disk_cache_pool.name,
            disk_cache_max_in_flight = config.disk_cache_pool.max_in_flight,
            source_pool = %config.source_pool.name,
            source_max_in_flight = config.source_pool.max_in_flight,
            "loader runtime started"
        );

        Ok(Self {
            coordination,
            disk_cache_pool,
            source_pool,
        })
    }

    /// Handle to the coordination thread.
    #[must_use]
    pub fn coordination(&self) -> CoordinationHandle {
        self.coordination.handle()
    }

    /// Primary pool.
    #[must_use]
    pub fn disk_cache_pool(&self) -> &Arc<WorkerPool> {
        &self.disk_cache_pool
    }

    /// Fallback pool.
    #[must_use]
    pub fn source_pool(&self) -> &Arc<WorkerPool> {
        &self.source_pool
    }

    /// Job factory reporting to `listener`.
    pub fn job_factory<R: Resource>(
        &self,
        listener: Arc<dyn EngineJobListener<R>>,
    ) -> EngineJobFactory<R> {
        EngineJobFactory::new(
            self.disk_cache_pool.clone(),
            self.source_pool.clone(),
            self.coordination.handle(),
            listener,
        )
    }

    /// Stop the coordination thread and wait for it.
    pub fn shutdown(self) -> std::thread::Result<()> {
        self.coordination.shutdown()
    }
}

impl std::fmt::Debug for LoaderRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRuntime")
            .field("coordination", &self.coordination)
            .field("disk_cache_pool", &self.disk_cache_pool)
            .field("source_pool", &self.source_pool)
            .finish()
    }
}
