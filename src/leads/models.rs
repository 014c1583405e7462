use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    FollowUp,
    Converted,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::FollowUp => "follow_up",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sales enquiry that may turn into a job card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_at: Option<DateTime<Utc>>,
}

/// Body of `PATCH /leads/:id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl LeadPatch {
    pub fn converted(job_card_id: impl Into<String>) -> Self {
        Self {
            status: Some(LeadStatus::Converted),
            job_card_id: Some(job_card_id.into()),
            phone: None,
        }
    }

    /// Merge into `lead`; moving to `converted` stamps `converted_at` once
    pub fn apply(self, mut lead: Lead, now: DateTime<Utc>) -> Lead {
        if let Some(status) = self.status {
            if status == LeadStatus::Converted && lead.converted_at.is_none() {
                lead.converted_at = Some(now);
            }
            lead.status = status;
        }
        if let Some(job_card_id) = self.job_card_id {
            lead.job_card_id = Some(job_card_id);
        }
        if let Some(phone) = self.phone {
            lead.phone = Some(phone);
        }
        lead
    }
}
