use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::JobCardStatus;

/// A unit of vehicle-service work as persisted by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCard {
    pub id: String,
    /// Human readable, `JC-YYYYMMDD-XXXX`
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub status: JobCardStatus,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub vehicle_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complaint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_engineer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_engineer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
}

/// Caller input for a new job card. Timestamps are not accepted.
#[derive(Debug, Clone, Default, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct JobCardDraft {
    pub id: Option<String>,
    pub number: Option<String>,
    pub status: Option<JobCardStatus>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub vehicle_number: String,
    pub complaint: Option<String>,
    pub assigned_engineer: Option<String>,
    pub assigned_engineer_id: Option<String>,
    pub quotation_id: Option<String>,
    pub lead_id: Option<String>,
}

/// Editable fields of an existing card. Status and timestamps go through
/// their own operations.
#[derive(Debug, Clone, Default, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct JobCardPatch {
    pub customer_name: Option<String>,
    pub vehicle_number: Option<String>,
    pub complaint: Option<String>,
    pub quotation_id: Option<String>,
}

impl JobCardPatch {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.vehicle_number.is_none()
            && self.complaint.is_none()
            && self.quotation_id.is_none()
    }

    /// Merge into `card`. Blank optional values clear the field.
    pub fn apply(self, mut card: JobCard) -> JobCard {
        if let Some(name) = clean(self.customer_name) {
            card.customer_name = name;
        }
        if let Some(vehicle) = clean(self.vehicle_number) {
            card.vehicle_number = vehicle;
        }
        if let Some(complaint) = self.complaint {
            card.complaint = clean(Some(complaint));
        }
        if let Some(quotation_id) = self.quotation_id {
            card.quotation_id = clean(Some(quotation_id));
        }
        card
    }
}

/// Body of `PATCH /job-cards/:id/assign-engineer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerAssignment {
    pub engineer_id: String,
    pub engineer_name: String,
}

/// Trim, and treat blank as absent
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
