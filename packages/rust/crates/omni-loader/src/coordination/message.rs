use std::sync::Arc;

use crate::error::Result;
use crate::key::JobKey;

/// A job whose outcome is processed on the coordination thread.
pub(crate) trait OutcomeTarget: Send + Sync {
    fn key(&self) -> &JobKey;

    /// Fan a finished result out to callbacks.
    fn handle_result(&self) -> Result<()>;

    /// Fan a failure out to callbacks.
    fn handle_failure(&self) -> Result<()>;
}

pub(crate) enum CoordinationMessage {
    Complete(Arc<dyn OutcomeTarget>),
    Exception(Arc<dyn OutcomeTarget>),
    Run(Box<dyn FnOnce() + Send + 'static>),
    Shutdown,
}
