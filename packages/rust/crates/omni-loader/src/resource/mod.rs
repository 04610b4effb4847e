//! Results produced by work units and the ref-counted handle that shares them.

mod engine_resource;
mod factory;

pub use engine_resource::{EngineResource, ResourceReleaseListener};
pub use factory::{DefaultEngineResourceFactory, EngineResourceFactory};

/// Raw result of a work unit (a decoded bitmap, a byte buffer, ...).
pub trait Resource: Send + 'static {
    /// Return the result to its pool, or free it.
    fn recycle(self);
}
