use std::sync::Arc;

use crate::error::Result;
use crate::resource::Resource;

use super::{EngineJob, ResourceCallback};

/// Ties one callback to the job it is waiting on, so the caller can
/// withdraw interest later.
pub struct LoadStatus<R: Resource> {
    job: Arc<EngineJob<R>>,
    callback: Arc<dyn ResourceCallback<R>>,
}

impl<R: Resource> LoadStatus<R> {
    /// Pair `callback` with `job`.
    pub fn new(job: Arc<EngineJob<R>>, callback: Arc<dyn ResourceCallback<R>>) -> Self {
        Self { job, callback }
    }

    /// The job the callback is registered with.
    #[must_use]
    pub fn job(&self) -> &Arc<EngineJob<R>> {
        &self.job
    }

    /// Remove the callback; cancels the job if no one else is waiting.
    /// Must run on the coordination thread.
    pub fn cancel(&self) -> Result<()> {
        self.job.remove_callback(&self.callback)
    }
}

impl<R: Resource> std::fmt::Debug for LoadStatus<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadStatus").field("job", &self.job).finish()
    }
}
