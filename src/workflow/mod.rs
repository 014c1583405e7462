//! Job card lifecycle: statuses and the allowed-transition graph

mod engine;
mod status;

pub use engine::{TransitionError, WorkflowEngine};
pub use status::{JobCardStatus, UnknownStatus};
