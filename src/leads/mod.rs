//! Leads and the job card completion listener that converts them

mod listener;
pub mod mock;
mod models;

pub use listener::LeadConversionListener;
pub use models::{Lead, LeadPatch, LeadStatus};
