pub mod app;
pub mod client;
pub mod config;
pub mod humanize;
pub mod jobcards;
pub mod leads;
pub mod observability;
pub mod routes;
pub mod server;
pub mod store;
pub mod workflow;
