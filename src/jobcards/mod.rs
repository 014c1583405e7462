//! Job cards: models, the service callers use, and the mock routes

mod error;
pub mod mock;
mod models;
mod service;

pub use error::ServiceError;
pub use models::{EngineerAssignment, JobCard, JobCardDraft, JobCardPatch};
pub use service::{JobCardEvent, JobCardService};
