//! Mock handlers for the job card routes, backed by a [`RecordStore`]

use std::sync::Arc;

use crate::client::{ApiError, ErrorCode, MockRegistry, Routed};
use crate::routes::{
    AssignEngineer, CreateJobCard, DeleteJobCard, GetJobCard, ListJobCards, UpdateJobCard, check_id,
};
use crate::store::RecordStore;
use crate::store::keys::JOB_CARDS;

use super::models::{EngineerAssignment, JobCard};

pub fn install(registry: &mut MockRegistry, store: Arc<dyn RecordStore>) {
    let s = store.clone();
    registry.route::<ListJobCards, _, _>(move |req| list(s.clone(), req));
    let s = store.clone();
    registry.route::<GetJobCard, _, _>(move |req| get(s.clone(), req));
    let s = store.clone();
    registry.route::<CreateJobCard, _, _>(move |req| create(s.clone(), req));
    let s = store.clone();
    registry.route::<UpdateJobCard, _, _>(move |req| update(s.clone(), req));
    let s = store.clone();
    registry.route::<DeleteJobCard, _, _>(move |req| delete(s.clone(), req));
    registry.route::<AssignEngineer, _, _>(move |req| assign_engineer(store.clone(), req));
}

fn load(store: &dyn RecordStore, id: &str) -> Result<JobCard, ApiError> {
    store
        .fetch(JOB_CARDS, id)?
        .ok_or_else(|| ApiError::not_found(format!("job card {} not found", id)))
}

async fn list(store: Arc<dyn RecordStore>, req: Routed<()>) -> Result<Vec<JobCard>, ApiError> {
    let status = req.query.get("status").map(|v| v.to_string());
    let mut cards: Vec<JobCard> = store.fetch_all(JOB_CARDS)?;

    if let Some(status) = status {
        cards.retain(|card| card.status.as_str() == status);
    }
    cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.number.cmp(&b.number)));
    Ok(cards)
}

async fn get(store: Arc<dyn RecordStore>, req: Routed<()>) -> Result<JobCard, ApiError> {
    load(store.as_ref(), req.param("id")?)
}

async fn create(store: Arc<dyn RecordStore>, req: Routed<JobCard>) -> Result<JobCard, ApiError> {
    let card = req.body;
    check_id(&card.id)?;
    if store.get(JOB_CARDS, &card.id)?.is_some() {
        return Err(ApiError::new(
            409,
            ErrorCode::Conflict,
            format!("job card {} already exists", card.id),
        ));
    }

    store.save(JOB_CARDS, &card.id, &card)?;
    Ok(card)
}

async fn update(store: Arc<dyn RecordStore>, req: Routed<JobCard>) -> Result<JobCard, ApiError> {
    let id = req.param("id")?.to_string();
    load(store.as_ref(), &id)?;

    let mut card = req.body;
    card.id = id;
    store.save(JOB_CARDS, &card.id, &card)?;
    Ok(card)
}

async fn delete(store: Arc<dyn RecordStore>, req: Routed<()>) -> Result<(), ApiError> {
    let id = req.param("id")?;
    if !store.delete(JOB_CARDS, id)? {
        return Err(ApiError::not_found(format!("job card {} not found", id)));
    }
    Ok(())
}

async fn assign_engineer(
    store: Arc<dyn RecordStore>,
    req: Routed<EngineerAssignment>,
) -> Result<JobCard, ApiError> {
    let mut card = load(store.as_ref(), req.param("id")?)?;
    if req.body.engineer_id.trim().is_empty() {
        return Err(ApiError::validation("engineerId is required"));
    }

    card.assigned_engineer_id = Some(req.body.engineer_id);
    card.assigned_engineer = Some(req.body.engineer_name).filter(|name| !name.is_empty());
    store.save(JOB_CARDS, &card.id, &card)?;
    Ok(card)
}
