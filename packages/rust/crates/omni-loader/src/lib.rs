//! omni-loader - Load job coordination for resource pipelines.
//!
//! Runs one unit of work (fetch, decode, ...) per request key on pooled
//! executors and fans the single outcome out to every interested callback:
//! - Callback registry with late-join delivery and safe withdrawal mid fan-out
//! - Cooperative + forceful cancellation when the last callback withdraws
//! - Outcomes marshalled onto one coordination thread
//! - Reference-counted result handles
//!
//! # Architecture
//!
//! ```text
//! EngineJob::start ──▶ disk-cache pool ──reschedule──▶ source pool
//!                              │                            │
//!                              └──── JobReporter ───────────┘
//!                                         │
//!                                         ▼
//!                              coordination thread (FIFO)
//!                                         │
//!              EngineResource::acquire ──▶ ResourceCallback::on_resource_ready
//! ```
//!
//! # Examples
//!
//! ```rust
//! use omni_loader::LoaderConfig;
//!
//! let config = LoaderConfig::from_yaml_str("source_pool:\n  max_in_flight: 2\n").unwrap();
//! assert_eq!(config.source_pool.max_in_flight, 2);
//! assert_eq!(config.disk_cache_pool.max_in_flight, 1);
//! ```

// ============================================================================
// Core modules
// ============================================================================

mod config;
mod coordination;
mod error;
mod executor;
mod job;
mod key;
mod observability;
mod resource;
mod runtime;

// ============================================================================
// Public exports
// ============================================================================

pub use config::{LoaderConfig, PoolConfig};
pub use coordination::{CoordinationHandle, CoordinationThread};
pub use error::{LoaderError, Result};
pub use executor::{Executor, Task, TaskHandle, WorkerPool};
pub use job::{
    EngineJob, EngineJobFactory, EngineJobListener, JobReporter, JobState, LoadStatus,
    ResourceCallback, WorkUnit,
};
pub use key::JobKey;
pub use observability::JobEvent;
pub use resource::{
    DefaultEngineResourceFactory, EngineResource, EngineResourceFactory, Resource,
    ResourceReleaseListener,
};
pub use runtime::LoaderRuntime;
