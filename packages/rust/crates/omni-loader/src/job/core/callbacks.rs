//! Callback registration, coordination thread only.

use std::sync::Arc;

use crate::error::Result;
use crate::job::{JobState, ResourceCallback};
use crate::observability::JobEvent;
use crate::resource::Resource;

use super::EngineJob;

/// Pending callbacks in notification order, plus the ones withdrawn after
/// an outcome was recorded. Withdrawn entries are filtered during fan-out
/// instead of being spliced out of a list that may be mid-iteration.
pub(super) struct CallbackRegistry<R: Resource> {
    pending: Vec<Arc<dyn ResourceCallback<R>>>,
    ignored: Vec<Arc<dyn ResourceCallback<R>>>,
}

impl<R: Resource> Default for CallbackRegistry<R> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            ignored: Vec::new(),
        }
    }
}

impl<R: Resource> CallbackRegistry<R> {
    pub(super) fn push(&mut self, callback: Arc<dyn ResourceCallback<R>>) {
        self.pending.push(callback);
    }

    /// Remove the first registration of `callback`.
    pub(super) fn remove(&mut self, callback: &Arc<dyn ResourceCallback<R>>) -> bool {
        match self
            .pending
            .iter()
            .position(|existing| same_callback(existing, callback))
        {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    pub(super) fn ignore(&mut self, callback: &Arc<dyn ResourceCallback<R>>) {
        if !self.is_ignored(callback) {
            self.ignored.push(Arc::clone(callback));
        }
    }

    pub(super) fn is_ignored(&self, callback: &Arc<dyn ResourceCallback<R>>) -> bool {
        self.ignored
            .iter()
            .any(|existing| same_callback(existing, callback))
    }

    pub(super) fn snapshot(&self) -> Vec<Arc<dyn ResourceCallback<R>>> {
        self.pending.clone()
    }

    pub(super) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn same_callback<R: Resource>(
    a: &Arc<dyn ResourceCallback<R>>,
    b: &Arc<dyn ResourceCallback<R>>,
) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl<R: Resource> EngineJob<R> {
    /// Register interest in the outcome.
    ///
    /// A callback added after the outcome is delivered hears about it
    /// immediately, with a reference acquired on its behalf.
    pub fn add_callback(&self, callback: Arc<dyn ResourceCallback<R>>) -> Result<()> {
        self.coordination.ensure_current("add_callback")?;

        match self.state() {
            JobState::Succeeded => {
                if let Some(resource) = self.engine_resource.get() {
                    resource.acquire()?;
                    callback.on_resource_ready(resource.clone());
                }
            }
            JobState::Failed => callback.on_load_failed(),
            JobState::Running | JobState::Cancelled => self.lock_callbacks().push(callback),
        }
        Ok(())
    }

    /// Withdraw interest. Removing the last pending callback cancels the job.
    pub fn remove_callback(&self, callback: &Arc<dyn ResourceCallback<R>>) -> Result<()> {
        self.coordination.ensure_current("remove_callback")?;

        if self.state().is_complete() {
            self.lock_callbacks().ignore(callback);
            tracing::trace!(
                event = JobEvent::CallbackIgnored.as_str(),
                key = %self.key,
                job_id = self.id,
                "callback withdrawn after completion"
            );
            return Ok(());
        }

        let now_empty = {
            let mut callbacks = self.lock_callbacks();
            callbacks.remove(callback);
            callbacks.is_empty()
        };
        if now_empty {
            self.cancel();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::EngineResource;

    struct Unit;

    impl Resource for Unit {
        fn recycle(self) {}
    }

    struct Noop;

    impl ResourceCallback<Unit> for Noop {
        fn on_resource_ready(&self, _resource: EngineResource<Unit>) {}
        fn on_load_failed(&self) {}
    }

    #[test]
    fn test_remove_only_drops_first_registration() {
        let mut registry = CallbackRegistry::<Unit>::default();
        let a: Arc<dyn ResourceCallback<Unit>> = Arc::new(Noop);
        let b: Arc<dyn ResourceCallback<Unit>> = Arc::new(Noop);
        registry.push(Arc::clone(&a));
        registry.push(Arc::clone(&b));
        registry.push(Arc::clone(&a));

        assert!(registry.remove(&a));
        assert_eq!(registry.len(), 2);
        let snapshot = registry.snapshot();
        assert!(same_callback(&snapshot[0], &b));
        assert!(same_callback(&snapshot[1], &a));
    }

    #[test]
    fn test_remove_unknown_callback_is_noop() {
        let mut registry = CallbackRegistry::<Unit>::default();
        let a: Arc<dyn ResourceCallback<Unit>> = Arc::new(Noop);
        let stranger: Arc<dyn ResourceCallback<Unit>> = Arc::new(Noop);
        registry.push(Arc::clone(&a));

        assert!(!registry.remove(&stranger));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ignored_set_has_no_duplicates() {
        let mut registry = CallbackRegistry::<Unit>::default();
        let a: Arc<dyn ResourceCallback<Unit>> = Arc::new(Noop);
        registry.ignore(&a);
        registry.ignore(&a);

        assert!(registry.is_ignored(&a));
        assert_eq!(registry.ignored.len(), 1);
    }
}
