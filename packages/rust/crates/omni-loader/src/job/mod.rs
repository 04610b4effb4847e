//! Load jobs: one unit of work, many interested callbacks, one outcome.

mod core;
mod factory;
mod reporter;
mod status;
mod types;

pub use self::core::EngineJob;
pub use factory::EngineJobFactory;
pub use reporter::JobReporter;
pub use status::LoadStatus;
pub use types::{EngineJobListener, JobState, ResourceCallback, WorkUnit};
