use super::{EngineResource, Resource};

/// Wraps raw results into handles. Injected into jobs so tests can observe
/// or replace handle construction.
pub trait EngineResourceFactory<R: Resource>: Send + Sync {
    /// Wrap `resource`, carrying the cacheability flag through.
    fn build(&self, resource: R, is_cacheable: bool) -> EngineResource<R>;
}

/// Builds plain [`EngineResource`] handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEngineResourceFactory;

impl<R: Resource> EngineResourceFactory<R> for DefaultEngineResourceFactory {
    fn build(&self, resource: R, is_cacheable: bool) -> EngineResource<R> {
        EngineResource::new(resource, is_cacheable)
    }
}
