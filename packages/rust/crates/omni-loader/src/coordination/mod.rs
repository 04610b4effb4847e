//! The single coordination thread on which every listener-visible state
//! transition happens.
//!
//! # Architecture
//!
//! ```text
//! worker thread                      coordination thread
//! ─────────────                      ───────────────────
//! JobReporter::resource_ready ──┐
//! JobReporter::load_failed ─────┼──▶ mailbox (FIFO) ──▶ EngineJob fan-out
//! CoordinationHandle::post ─────┘                        ResourceCallback::*
//! ```

mod message;
mod thread;

pub(crate) use message::{CoordinationMessage, OutcomeTarget};
pub use thread::{CoordinationHandle, CoordinationThread};
