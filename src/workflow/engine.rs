use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use super::status::JobCardStatus;
use crate::jobcards::JobCard;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: JobCardStatus,
        to: JobCardStatus,
    },
}

/// Static transition graph for job cards. Role-agnostic; permission checks
/// belong to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowEngine;

impl WorkflowEngine {
    pub fn new() -> Self {
        Self
    }

    /// Allowed targets from `current`, in display order
    pub fn next_statuses(&self, current: JobCardStatus) -> &'static [JobCardStatus] {
        use super::status::JobCardStatus::*;

        match current {
            ArrivalPending => &[JobCardPendingVehicle],
            JobCardPendingVehicle => &[JobCardActive],
            JobCardActive => &[CheckInOnly, ManagerQuote],
            CheckInOnly => &[ManagerQuote],
            NoResponseLead => &[],
            ManagerQuote => &[Assigned],
            AwaitingQuotationApproval => &[Created],
            Created => &[Assigned],
            Assigned => &[InProgress],
            InProgress => &[PartsPending, Completed],
            PartsPending => &[InProgress, Completed],
            Completed => &[Invoiced],
            Invoiced => &[],
        }
    }

    pub fn can_transition(&self, from: JobCardStatus, to: JobCardStatus) -> bool {
        self.next_statuses(from).contains(&to)
    }

    pub fn is_terminal(&self, status: JobCardStatus) -> bool {
        self.next_statuses(status).is_empty()
    }

    pub fn transition(&self, card: JobCard, target: JobCardStatus) -> Result<JobCard, TransitionError> {
        self.transition_at(card, target, Utc::now())
    }

    /// Apply `target` to `card` with an explicit clock.
    ///
    /// `In Progress` stamps `start_time` only when it is unset, so resuming
    /// from `Parts Pending` keeps the original start. `Completed` stamps
    /// `completed_at`. No other target touches timestamps.
    pub fn transition_at(
        &self,
        mut card: JobCard,
        target: JobCardStatus,
        now: DateTime<Utc>,
    ) -> Result<JobCard, TransitionError> {
        let from = card.status;
        if !self.can_transition(from, target) {
            return Err(TransitionError::InvalidTransition { from, to: target });
        }

        match target {
            JobCardStatus::InProgress if card.start_time.is_none() => card.start_time = Some(now),
            JobCardStatus::Completed => card.completed_at = Some(now),
            _ => {}
        }

        debug!(id = %card.id, %from, to = %target, "Job card transitioned");
        card.status = target;
        Ok(card)
    }
}
