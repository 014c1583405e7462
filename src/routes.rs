//! Route catalogue shared by the mock registry and the services
//!
//! Every route the client talks to is named here once. The mock registry
//! registers against [`RouteId::pattern`]; callers build concrete paths with
//! [`RouteId::path`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

use crate::client::{ApiError, Method};
use crate::jobcards::{EngineerAssignment, JobCard};
use crate::leads::{Lead, LeadPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteId {
    ListJobCards,
    GetJobCard,
    CreateJobCard,
    UpdateJobCard,
    DeleteJobCard,
    AssignEngineer,
    ListLeads,
    GetLead,
    CreateLead,
    UpdateLead,
}

impl RouteId {
    pub const ALL: [RouteId; 10] = [
        RouteId::ListJobCards,
        RouteId::GetJobCard,
        RouteId::CreateJobCard,
        RouteId::UpdateJobCard,
        RouteId::DeleteJobCard,
        RouteId::AssignEngineer,
        RouteId::ListLeads,
        RouteId::GetLead,
        RouteId::CreateLead,
        RouteId::UpdateLead,
    ];

    pub fn method(&self) -> Method {
        match self {
            RouteId::ListJobCards | RouteId::GetJobCard | RouteId::ListLeads | RouteId::GetLead => {
                Method::Get
            }
            RouteId::CreateJobCard | RouteId::CreateLead => Method::Post,
            RouteId::UpdateJobCard => Method::Put,
            RouteId::AssignEngineer | RouteId::UpdateLead => Method::Patch,
            RouteId::DeleteJobCard => Method::Delete,
        }
    }

    pub fn pattern(&self) -> &'static str {
        match self {
            RouteId::ListJobCards | RouteId::CreateJobCard => "/job-cards",
            RouteId::GetJobCard | RouteId::UpdateJobCard | RouteId::DeleteJobCard => "/job-cards/:id",
            RouteId::AssignEngineer => "/job-cards/:id/assign-engineer",
            RouteId::ListLeads | RouteId::CreateLead => "/leads",
            RouteId::GetLead | RouteId::UpdateLead => "/leads/:id",
        }
    }

    /// Substitute placeholders left to right. Surplus values are ignored,
    /// missing ones leave the placeholder in place.
    pub fn path(&self, values: &[&str]) -> String {
        let mut values = values.iter();
        self.pattern()
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(_) => values.next().map(|v| v.to_string()).unwrap_or_else(|| segment.to_string()),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// [`RouteId::path`] for record ids, rejecting any id that is not a
    /// valid single path segment
    pub fn path_for(&self, ids: &[&str]) -> Result<String, ApiError> {
        for id in ids {
            check_id(id)?;
        }
        Ok(self.path(ids))
    }
}

/// Record ids are sent as one path segment, so they are limited to unreserved
/// URL characters (`A-Z a-z 0-9 - _ . ~`). `.` and `..` are refused.
pub fn check_id(id: &str) -> Result<&str, ApiError> {
    let unreserved = id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'));

    if id.is_empty() || !unreserved || id == "." || id == ".." {
        return Err(ApiError::validation(format!("invalid record id {:?}", id)));
    }
    Ok(id)
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.pattern())
    }
}

/// A catalogued route with its request body and reply types
pub trait Endpoint {
    const ROUTE: RouteId;
    type Body: DeserializeOwned + Send + 'static;
    type Reply: Serialize + Send + 'static;
}

macro_rules! endpoint {
    ($name:ident, $route:ident, $body:ty, $reply:ty) => {
        pub struct $name;

        impl Endpoint for $name {
            const ROUTE: RouteId = RouteId::$route;
            type Body = $body;
            type Reply = $reply;
        }
    };
}

endpoint!(ListJobCards, ListJobCards, (), Vec<JobCard>);
endpoint!(GetJobCard, GetJobCard, (), JobCard);
endpoint!(CreateJobCard, CreateJobCard, JobCard, JobCard);
endpoint!(UpdateJobCard, UpdateJobCard, JobCard, JobCard);
endpoint!(DeleteJobCard, DeleteJobCard, (), ());
endpoint!(AssignEngineer, AssignEngineer, EngineerAssignment, JobCard);
endpoint!(ListLeads, ListLeads, (), Vec<Lead>);
endpoint!(GetLead, GetLead, (), Lead);
endpoint!(CreateLead, CreateLead, Lead, Lead);
endpoint!(UpdateLead, UpdateLead, LeadPatch, Lead);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PathPattern;

    #[test]
    fn test_path_substitution() {
        assert_eq!(RouteId::GetJobCard.path(&["42"]), "/job-cards/42");
        assert_eq!(
            RouteId::AssignEngineer.path(&["jc-1"]),
            "/job-cards/jc-1/assign-engineer"
        );
        assert_eq!(RouteId::ListLeads.path(&[]), "/leads");
        assert_eq!(RouteId::GetLead.path(&[]), "/leads/:id");
    }

    #[test]
    fn test_built_paths_match_own_pattern() {
        for route in RouteId::ALL {
            let pattern = PathPattern::parse(route.pattern());
            let path = route.path(&["abc"]);
            assert!(pattern.matches(&path).is_some(), "{} did not match {}", path, route);
        }
    }

    #[test]
    fn test_check_id() {
        for id in ["jc-1", "3f2b9c1e-0d4a-4c55-9a7e-1b2c3d4e5f60", "lead_7.v2~a"] {
            assert_eq!(check_id(id).unwrap(), id);
        }
        for id in ["", ".", "..", "a/b", "jc#1", "jc?1", "jc 1", "50%", "jó"] {
            let err = check_id(id).unwrap_err();
            assert_eq!(err.status, 422, "{:?}", id);
        }
    }

    #[test]
    fn test_path_for_rejects_reserved_characters() {
        assert_eq!(RouteId::GetLead.path_for(&["lead-1"]).unwrap(), "/leads/lead-1");
        assert!(RouteId::GetJobCard.path_for(&["a/b"]).is_err());
        assert!(RouteId::AssignEngineer.path_for(&["jc#1"]).is_err());
    }

    #[test]
    fn test_method_and_pattern_pairs_unique() {
        let mut keys: Vec<_> = RouteId::ALL.iter().map(|r| (r.method(), r.pattern())).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), RouteId::ALL.len());
    }
}
