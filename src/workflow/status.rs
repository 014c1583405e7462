use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a job card. Serialized as the exact wire names the
/// backend uses, which mix snake_case and title case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum JobCardStatus {
    #[serde(rename = "arrival_pending")]
    ArrivalPending,
    #[serde(rename = "job_card_pending_vehicle")]
    JobCardPendingVehicle,
    #[serde(rename = "job_card_active")]
    JobCardActive,
    #[serde(rename = "check_in_only")]
    CheckInOnly,
    #[serde(rename = "no_response_lead")]
    NoResponseLead,
    #[serde(rename = "manager_quote")]
    ManagerQuote,
    #[serde(rename = "Awaiting Quotation Approval")]
    AwaitingQuotationApproval,
    #[default]
    Created,
    Assigned,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Parts Pending")]
    PartsPending,
    Completed,
    Invoiced,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown job card status: {0}")]
pub struct UnknownStatus(pub String);

impl JobCardStatus {
    pub const ALL: [JobCardStatus; 13] = [
        JobCardStatus::ArrivalPending,
        JobCardStatus::JobCardPendingVehicle,
        JobCardStatus::JobCardActive,
        JobCardStatus::CheckInOnly,
        JobCardStatus::NoResponseLead,
        JobCardStatus::ManagerQuote,
        JobCardStatus::AwaitingQuotationApproval,
        JobCardStatus::Created,
        JobCardStatus::Assigned,
        JobCardStatus::InProgress,
        JobCardStatus::PartsPending,
        JobCardStatus::Completed,
        JobCardStatus::Invoiced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobCardStatus::ArrivalPending => "arrival_pending",
            JobCardStatus::JobCardPendingVehicle => "job_card_pending_vehicle",
            JobCardStatus::JobCardActive => "job_card_active",
            JobCardStatus::CheckInOnly => "check_in_only",
            JobCardStatus::NoResponseLead => "no_response_lead",
            JobCardStatus::ManagerQuote => "manager_quote",
            JobCardStatus::AwaitingQuotationApproval => "Awaiting Quotation Approval",
            JobCardStatus::Created => "Created",
            JobCardStatus::Assigned => "Assigned",
            JobCardStatus::InProgress => "In Progress",
            JobCardStatus::PartsPending => "Parts Pending",
            JobCardStatus::Completed => "Completed",
            JobCardStatus::Invoiced => "Invoiced",
        }
    }

    /// Reached the point where the linked lead counts as converted
    pub fn is_done(&self) -> bool {
        matches!(self, JobCardStatus::Completed | JobCardStatus::Invoiced)
    }
}

impl fmt::Display for JobCardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobCardStatus {
    type Err = UnknownStatus;

    /// Exact wire names only
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobCardStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
