use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::models::{Lead, LeadPatch, LeadStatus};
use crate::client::{ApiClient, ApiError, RequestConfig};
use crate::jobcards::JobCardEvent;
use crate::routes::RouteId;

/// Marks the lead behind a finished job card as converted
#[derive(Clone)]
pub struct LeadConversionListener {
    api: ApiClient,
}

impl LeadConversionListener {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Returns the updated lead, or `None` when the event needs no write
    pub async fn handle(&self, event: &JobCardEvent) -> Result<Option<Lead>, ApiError> {
        let JobCardEvent::Completed {
            job_card_id,
            lead_id: Some(lead_id),
            ..
        } = event
        else {
            return Ok(None);
        };

        let path = RouteId::GetLead.path_for(&[lead_id.as_str()])?;
        let current: Lead = self
            .api
            .get(&path, RequestConfig::default().without_cache())
            .await?
            .data;
        if current.status == LeadStatus::Converted {
            debug!(lead_id, "Lead already converted");
            return Ok(None);
        }

        let path = RouteId::UpdateLead.path_for(&[lead_id.as_str()])?;
        let lead: Lead = self
            .api
            .patch(&path, &LeadPatch::converted(job_card_id.as_str()), RequestConfig::default())
            .await?
            .data;

        self.api.cache().invalidate_prefix(RouteId::ListLeads.pattern());
        info!(lead_id, job_card_id, "Lead converted");
        Ok(Some(lead))
    }

    /// Consume events until the sender side is dropped
    pub fn spawn(self, mut events: broadcast::Receiver<JobCardEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Err(e) = self.handle(&event).await {
                            warn!(error = %e, ?event, "Lead conversion failed");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Lead listener lagged behind job card events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Lead listener stopped");
        })
    }
}
