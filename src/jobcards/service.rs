use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::ServiceError;
use super::models::{EngineerAssignment, JobCard, JobCardDraft, JobCardPatch, clean};
use crate::client::{ApiClient, RequestConfig};
use crate::routes::{RouteId, check_id};
use crate::workflow::{JobCardStatus, WorkflowEngine};

const EVENT_CAPACITY: usize = 64;

/// Published after a status write succeeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCardEvent {
    /// The card reached `Completed` or `Invoiced`
    Completed {
        job_card_id: String,
        lead_id: Option<String>,
        status: JobCardStatus,
    },
}

/// Job card operations on top of the API client.
///
/// Every status change is checked against the [`WorkflowEngine`] before any
/// write. Cached `/job-cards` reads are dropped after each successful write
/// so the next read sees the persisted record.
#[derive(Clone)]
pub struct JobCardService {
    api: ApiClient,
    engine: WorkflowEngine,
    events: broadcast::Sender<JobCardEvent>,
}

impl JobCardService {
    pub fn new(api: ApiClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            engine: WorkflowEngine::new(),
            events,
        }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobCardEvent> {
        self.events.subscribe()
    }

    pub async fn create(&self, draft: JobCardDraft) -> Result<JobCard, ServiceError> {
        let card = prepare(draft)?;
        let path = RouteId::CreateJobCard.path(&[]);

        let created: JobCard = self
            .api
            .post(&path, &card, RequestConfig::default())
            .await?
            .data;

        self.invalidate();
        info!(id = %created.id, number = %created.number, "Job card created");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> Result<JobCard, ServiceError> {
        self.read(id, RequestConfig::default()).await
    }

    pub async fn list(&self, status: Option<JobCardStatus>) -> Result<Vec<JobCard>, ServiceError> {
        let mut config = RequestConfig::default();
        if let Some(status) = status {
            config = config.with_param("status", status.as_str());
        }

        let path = RouteId::ListJobCards.path(&[]);
        Ok(self.api.get(&path, config).await?.data)
    }

    pub async fn update(&self, id: &str, patch: JobCardPatch) -> Result<JobCard, ServiceError> {
        let current = self.persisted(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }
        self.put(patch.apply(current)).await
    }

    /// Status is left as is
    pub async fn assign_engineer(
        &self,
        id: &str,
        engineer_id: &str,
        engineer_name: &str,
    ) -> Result<JobCard, ServiceError> {
        let body = EngineerAssignment {
            engineer_id: clean(Some(engineer_id.to_string()))
                .ok_or_else(|| ServiceError::Invalid("engineer id is required".to_string()))?,
            engineer_name: engineer_name.trim().to_string(),
        };

        let path = record_path(RouteId::AssignEngineer, id)?;
        let card: JobCard = self
            .api
            .patch(&path, &body, RequestConfig::default())
            .await
            .map_err(|err| ServiceError::from_api(id, err))?
            .data;

        self.invalidate();
        info!(id, engineer = %body.engineer_name, "Engineer assigned");
        Ok(card)
    }

    /// Move the card to `target`. Illegal transitions fail before anything
    /// is written.
    pub async fn update_status(&self, id: &str, target: JobCardStatus) -> Result<JobCard, ServiceError> {
        let current = self.persisted(id).await?;
        let next = self.engine.transition(current, target)?;

        let saved = self.put(next).await?;
        info!(id, status = %saved.status, "Job card status updated");
        self.publish(&saved);
        Ok(saved)
    }

    /// `Completed` → `Invoiced`, recording the invoice
    pub async fn mark_invoiced(&self, id: &str, invoice_number: &str) -> Result<JobCard, ServiceError> {
        let invoice_number = clean(Some(invoice_number.to_string()))
            .ok_or_else(|| ServiceError::Invalid("invoice number is required".to_string()))?;

        let current = self.persisted(id).await?;
        let mut next = self.engine.transition(current, JobCardStatus::Invoiced)?;
        next.invoice_number = Some(invoice_number);
        next.invoice_created_at = Some(Utc::now());

        let saved = self.put(next).await?;
        info!(id, invoice = ?saved.invoice_number, "Job card invoiced");
        self.publish(&saved);
        Ok(saved)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let path = record_path(RouteId::DeleteJobCard, id)?;
        let _: Value = self
            .api
            .delete(&path, RequestConfig::default())
            .await
            .map_err(|err| ServiceError::from_api(id, err))?
            .data;

        self.invalidate();
        info!(id, "Job card deleted");
        Ok(())
    }

    /// The record as stored right now. Writes build on this rather than on a
    /// cached copy another editor may have superseded.
    async fn persisted(&self, id: &str) -> Result<JobCard, ServiceError> {
        self.read(id, RequestConfig::default().without_cache()).await
    }

    async fn read(&self, id: &str, config: RequestConfig) -> Result<JobCard, ServiceError> {
        let path = record_path(RouteId::GetJobCard, id)?;
        self.api
            .get(&path, config)
            .await
            .map(|response| response.data)
            .map_err(|err| ServiceError::from_api(id, err))
    }

    async fn put(&self, card: JobCard) -> Result<JobCard, ServiceError> {
        let id = card.id.clone();
        let path = record_path(RouteId::UpdateJobCard, &id)?;
        let saved: JobCard = self
            .api
            .put(&path, &card, RequestConfig::default())
            .await
            .map_err(|err| ServiceError::from_api(&id, err))?
            .data;

        self.invalidate();
        Ok(saved)
    }

    fn invalidate(&self) {
        let dropped = self.api.cache().invalidate_prefix(RouteId::ListJobCards.pattern());
        if dropped > 0 {
            debug!(dropped, "Invalidated cached job card reads");
        }
    }

    fn publish(&self, card: &JobCard) {
        if !card.status.is_done() {
            return;
        }

        let event = JobCardEvent::Completed {
            job_card_id: card.id.clone(),
            lead_id: card.lead_id.clone(),
            status: card.status,
        };

        // No subscribers is not an error
        if self.events.send(event).is_err() {
            debug!(id = %card.id, "No job card event subscribers");
        }
    }
}

fn record_path(route: RouteId, id: &str) -> Result<String, ServiceError> {
    route
        .path_for(&[id])
        .map_err(|err| ServiceError::Invalid(err.message))
}

fn valid_id(id: Option<String>) -> Result<Option<String>, ServiceError> {
    match clean(id) {
        Some(id) => {
            check_id(&id).map_err(|err| ServiceError::Invalid(err.message))?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

/// Normalize a draft into the card that gets POSTed
fn prepare(draft: JobCardDraft) -> Result<JobCard, ServiceError> {
    let customer_name = clean(Some(draft.customer_name))
        .ok_or_else(|| ServiceError::Invalid("customer name is required".to_string()))?;
    let vehicle_number = clean(Some(draft.vehicle_number))
        .ok_or_else(|| ServiceError::Invalid("vehicle number is required".to_string()))?;

    let id = valid_id(draft.id)?;
    let lead_id = valid_id(draft.lead_id)?;
    let now = Utc::now();

    Ok(JobCard {
        id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        number: clean(draft.number).unwrap_or_else(|| generate_number(now)),
        status: draft.status.unwrap_or_default(),
        customer_name,
        vehicle_number,
        complaint: clean(draft.complaint),
        assigned_engineer: clean(draft.assigned_engineer),
        assigned_engineer_id: clean(draft.assigned_engineer_id),
        created_at: Some(now),
        start_time: None,
        completed_at: None,
        invoice_created_at: None,
        quotation_id: clean(draft.quotation_id),
        invoice_number: None,
        lead_id,
    })
}

/// `JC-YYYYMMDD-XXXX` with a random uppercase hex suffix
fn generate_number(now: chrono::DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..4].to_uppercase();
    format!("JC-{}-{}", now.format("%Y%m%d"), suffix)
}
