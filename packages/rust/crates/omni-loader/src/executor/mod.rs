//! Executors that run work units off the coordination thread.

mod pool;

pub use pool::WorkerPool;

/// A unit of work submitted to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs tasks in the background.
pub trait Executor: Send + Sync {
    /// Submit `task` and return a handle that can cancel it.
    fn submit(&self, task: Task) -> Box<dyn TaskHandle>;
}

/// Cancellable handle to a submitted task.
pub trait TaskHandle: Send + Sync {
    /// Best-effort cancellation. A task that already started may run to the end.
    fn cancel(&self);

    /// Whether the task finished or was cancelled.
    fn is_finished(&self) -> bool;
}
