//! Mock handlers for the lead routes

use chrono::Utc;
use std::sync::Arc;

use crate::client::{ApiError, ErrorCode, MockRegistry, Routed};
use crate::routes::{CreateLead, GetLead, ListLeads, UpdateLead, check_id};
use crate::store::RecordStore;
use crate::store::keys::LEADS;

use super::models::{Lead, LeadPatch};

pub fn install(registry: &mut MockRegistry, store: Arc<dyn RecordStore>) {
    let s = store.clone();
    registry.route::<ListLeads, _, _>(move |req| list(s.clone(), req));
    let s = store.clone();
    registry.route::<GetLead, _, _>(move |req| get(s.clone(), req));
    let s = store.clone();
    registry.route::<CreateLead, _, _>(move |req| create(s.clone(), req));
    registry.route::<UpdateLead, _, _>(move |req| update(store.clone(), req));
}

fn load(store: &dyn RecordStore, id: &str) -> Result<Lead, ApiError> {
    store
        .fetch(LEADS, id)?
        .ok_or_else(|| ApiError::not_found(format!("lead {} not found", id)))
}

async fn list(store: Arc<dyn RecordStore>, _req: Routed<()>) -> Result<Vec<Lead>, ApiError> {
    Ok(store.fetch_all(LEADS)?)
}

async fn get(store: Arc<dyn RecordStore>, req: Routed<()>) -> Result<Lead, ApiError> {
    load(store.as_ref(), req.param("id")?)
}

async fn create(store: Arc<dyn RecordStore>, req: Routed<Lead>) -> Result<Lead, ApiError> {
    let lead = req.body;
    check_id(&lead.id)?;
    if store.get(LEADS, &lead.id)?.is_some() {
        return Err(ApiError::new(
            409,
            ErrorCode::Conflict,
            format!("lead {} already exists", lead.id),
        ));
    }

    store.save(LEADS, &lead.id, &lead)?;
    Ok(lead)
}

async fn update(store: Arc<dyn RecordStore>, req: Routed<LeadPatch>) -> Result<Lead, ApiError> {
    let lead = load(store.as_ref(), req.param("id")?)?;
    let lead = req.body.apply(lead, Utc::now());
    store.save(LEADS, &lead.id, &lead)?;
    Ok(lead)
}
