//! Reference-counted result handle.
//!
//! The count and the released marker share one atomic word: `RELEASED` is a
//! sentinel that no acquire can step past, so the transition to zero happens
//! exactly once even when callbacks release concurrently.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::Resource;
use crate::error::{LoaderError, Result};
use crate::key::JobKey;
use crate::observability::JobEvent;

const RELEASED: usize = usize::MAX;

/// Receives the raw result once the last reference to its handle is gone,
/// e.g. to move it into a memory cache instead of recycling it.
pub trait ResourceReleaseListener<R: Resource>: Send + Sync {
    /// Take ownership of the released result.
    fn on_resource_released(&self, key: &JobKey, resource: R);
}

struct ReleaseTarget<R: Resource> {
    key: JobKey,
    listener: Arc<dyn ResourceReleaseListener<R>>,
}

struct Shared<R: Resource> {
    resource: Mutex<Option<R>>,
    is_cacheable: bool,
    acquired: AtomicUsize,
    release_target: OnceLock<ReleaseTarget<R>>,
}

/// Shared handle over a job's result. Clones point at the same count.
pub struct EngineResource<R: Resource> {
    shared: Arc<Shared<R>>,
}

impl<R: Resource> Clone for EngineResource<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: Resource> EngineResource<R> {
    /// Wrap a raw result with a reference count of zero.
    pub fn new(resource: R, is_cacheable: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                resource: Mutex::new(Some(resource)),
                is_cacheable,
                acquired: AtomicUsize::new(0),
                release_target: OnceLock::new(),
            }),
        }
    }

    /// Whether the owner may put this result in a memory cache.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.shared.is_cacheable
    }

    /// Current reference count; zero once released.
    #[must_use]
    pub fn acquired(&self) -> usize {
        match self.shared.acquired.load(Ordering::Acquire) {
            RELEASED => 0,
            count => count,
        }
    }

    /// True once the count dropped back to zero and the result was handed off.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.shared.acquired.load(Ordering::Acquire) == RELEASED
    }

    /// Route the released result to `listener` instead of recycling it.
    ///
    /// Returns `false` if a listener was already attached.
    pub fn set_release_listener(
        &self,
        key: JobKey,
        listener: Arc<dyn ResourceReleaseListener<R>>,
    ) -> bool {
        self.shared
            .release_target
            .set(ReleaseTarget { key, listener })
            .is_ok()
    }

    /// Increment the reference count.
    pub fn acquire(&self) -> Result<()> {
        self.shared
            .acquired
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| match count {
                RELEASED => None,
                count => count.checked_add(1).filter(|next| *next != RELEASED),
            })
            .map(|_| ())
            .map_err(|_| LoaderError::ResourceReleased)
    }

    /// Decrement the reference count, handing the result off at zero.
    pub fn release(&self) -> Result<()> {
        let previous = self
            .shared
            .acquired
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| match count {
                0 | RELEASED => None,
                1 => Some(RELEASED),
                count => Some(count - 1),
            })
            .map_err(|count| {
                if count == RELEASED {
                    LoaderError::ResourceReleased
                } else {
                    LoaderError::ResourceNotAcquired
                }
            })?;

        if previous == 1 {
            self.hand_off();
        }
        Ok(())
    }

    /// Read the raw result. `None` after release.
    pub fn with_resource<T>(&self, f: impl FnOnce(&R) -> T) -> Option<T> {
        let guard = self
            .shared
            .resource
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(f)
    }

    /// Whether both handles share one count.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn hand_off(&self) {
        let taken = self
            .shared
            .resource
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(resource) = taken else {
            return;
        };

        match self.shared.release_target.get() {
            Some(target) => {
                tracing::trace!(
                    event = JobEvent::ResourceReleased.as_str(),
                    key = %target.key,
                    cacheable = self.shared.is_cacheable,
                    "resource released to listener"
                );
                target.listener.on_resource_released(&target.key, resource);
            }
            None => {
                tracing::trace!(
                    event = JobEvent::ResourceReleased.as_str(),
                    cacheable = self.shared.is_cacheable,
                    "resource recycled"
                );
                resource.recycle();
            }
        }
    }
}

impl<R: Resource> fmt::Debug for EngineResource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineResource")
            .field("acquired", &self.acquired())
            .field("released", &self.is_released())
            .field("is_cacheable", &self.shared.is_cacheable)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    struct Counted(Arc<AtomicUsize>);

    impl Resource for Counted {
        fn recycle(self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_before_acquire_is_rejected() {
        let recycled = Arc::new(AtomicUsize::new(0));
        let handle = EngineResource::new(Counted(Arc::clone(&recycled)), true);

        assert_eq!(handle.release(), Err(LoaderError::ResourceNotAcquired));
        assert_eq!(recycled.load(Ordering::SeqCst), 0);
        assert!(!handle.is_released());
    }

    #[test]
    fn test_sentinel_is_not_reachable_by_acquire() {
        let handle = EngineResource::new(Counted(Arc::new(AtomicUsize::new(0))), false);
        handle.shared.acquired.store(RELEASED - 1, Ordering::SeqCst);
        assert_eq!(handle.acquire(), Err(LoaderError::ResourceReleased));
    }
}
