//! Job card service end to end against the in-process mock backend

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use workshop::app::{App, mock_registry};
use workshop::client::{MockBackend, RequestConfig};
use workshop::config::{Config, HumanDuration};
use workshop::jobcards::{JobCardDraft, JobCardEvent, JobCardPatch, ServiceError};
use workshop::leads::{Lead, LeadStatus};
use workshop::store::{MemoryStore, RecordStore};
use workshop::workflow::{JobCardStatus, TransitionError};

fn test_config() -> Config {
    let mut config = Config::default();
    config.client.retries = 0;
    config.client.retry_delay = HumanDuration::from_millis(1);
    config
}

fn draft() -> JobCardDraft {
    JobCardDraft::builder()
        .customer_name("Asha Rao".to_string())
        .vehicle_number("KA01AB1234".to_string())
        .complaint("Brake noise".to_string())
        .build()
}

#[tokio::test]
async fn test_status_lifecycle() {
    let app = App::build(&test_config()).unwrap();
    let service = &app.jobcards;

    let card = service.create(draft()).await.unwrap();
    assert_eq!(card.status, JobCardStatus::Created);
    assert!(card.number.starts_with("JC-"));
    assert!(card.created_at.is_some());

    let assigned = service.update_status(&card.id, JobCardStatus::Assigned).await.unwrap();
    assert_eq!(assigned.status, JobCardStatus::Assigned);
    assert_eq!(assigned.assigned_engineer, card.assigned_engineer);

    let err = service
        .update_status(&card.id, JobCardStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Workflow(TransitionError::InvalidTransition {
            from: JobCardStatus::Assigned,
            to: JobCardStatus::Completed,
        })
    ));

    let unchanged = service.get(&card.id).await.unwrap();
    assert_eq!(unchanged.status, JobCardStatus::Assigned);

    let started = service.update_status(&card.id, JobCardStatus::InProgress).await.unwrap();
    assert!(started.start_time.is_some());
    assert!(started.completed_at.is_none());

    let done = service.update_status(&card.id, JobCardStatus::Completed).await.unwrap();
    assert_eq!(done.status, JobCardStatus::Completed);
    assert!(done.completed_at.is_some());
    assert_eq!(done.start_time, started.start_time);

    let reloaded = service.get(&card.id).await.unwrap();
    assert_eq!(reloaded, done);
}

#[tokio::test]
async fn test_parts_pending_keeps_start_time() {
    let app = App::build(&test_config()).unwrap();
    let service = &app.jobcards;

    let card = service.create(draft()).await.unwrap();
    service.update_status(&card.id, JobCardStatus::Assigned).await.unwrap();
    let started = service.update_status(&card.id, JobCardStatus::InProgress).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    service.update_status(&card.id, JobCardStatus::PartsPending).await.unwrap();
    let resumed = service.update_status(&card.id, JobCardStatus::InProgress).await.unwrap();

    assert_eq!(resumed.start_time, started.start_time);
}

#[tokio::test]
async fn test_assign_engineer_and_update() {
    let app = App::build(&test_config()).unwrap();
    let service = &app.jobcards;
    let card = service.create(draft()).await.unwrap();

    let assigned = service.assign_engineer(&card.id, "eng-7", "Ravi").await.unwrap();
    assert_eq!(assigned.assigned_engineer.as_deref(), Some("Ravi"));
    assert_eq!(assigned.assigned_engineer_id.as_deref(), Some("eng-7"));
    assert_eq!(assigned.status, JobCardStatus::Created);

    let patch = JobCardPatch::builder()
        .complaint("Brake noise, AC weak".to_string())
        .build();
    let updated = service.update(&card.id, patch).await.unwrap();
    assert_eq!(updated.complaint.as_deref(), Some("Brake noise, AC weak"));
    assert_eq!(updated.assigned_engineer.as_deref(), Some("Ravi"));

    assert!(matches!(
        service.assign_engineer(&card.id, " ", "Nobody").await,
        Err(ServiceError::Invalid(_))
    ));
}

#[tokio::test]
async fn test_missing_card_is_not_found() {
    let app = App::build(&test_config()).unwrap();
    let service = &app.jobcards;

    assert!(matches!(service.get("ghost").await, Err(ServiceError::NotFound(id)) if id == "ghost"));
    assert!(matches!(
        service.update_status("ghost", JobCardStatus::Assigned).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(service.delete("ghost").await, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_list_reflects_writes() {
    let app = App::build(&test_config()).unwrap();
    let service = &app.jobcards;

    let first = service.create(draft()).await.unwrap();
    assert_eq!(service.list(None).await.unwrap().len(), 1);

    let second = service.create(draft()).await.unwrap();
    service.update_status(&second.id, JobCardStatus::Assigned).await.unwrap();

    let all = service.list(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let assigned = service.list(Some(JobCardStatus::Assigned)).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, second.id);

    service.delete(&first.id).await.unwrap();
    assert_eq!(service.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_writes_build_on_persisted_record() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let config = test_config();
    let desk = App::with_backend(Arc::new(MockBackend::new(mock_registry(store.clone()))), &config);
    let bay = App::with_backend(Arc::new(MockBackend::new(mock_registry(store))), &config);

    let card = desk.jobcards.create(draft()).await.unwrap();
    assert_eq!(desk.jobcards.get(&card.id).await.unwrap().status, JobCardStatus::Created);

    bay.jobcards.update_status(&card.id, JobCardStatus::Assigned).await.unwrap();
    bay.jobcards.update_status(&card.id, JobCardStatus::InProgress).await.unwrap();

    // The desk still holds its cached Created copy
    assert_eq!(desk.jobcards.get(&card.id).await.unwrap().status, JobCardStatus::Created);

    let err = desk
        .jobcards
        .update_status(&card.id, JobCardStatus::Assigned)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Workflow(TransitionError::InvalidTransition {
            from: JobCardStatus::InProgress,
            to: JobCardStatus::Assigned,
        })
    ));

    let patch = JobCardPatch::builder().complaint("AC weak".to_string()).build();
    let merged = desk.jobcards.update(&card.id, patch).await.unwrap();
    assert_eq!(merged.status, JobCardStatus::InProgress);
    assert!(merged.start_time.is_some());
    assert_eq!(merged.complaint.as_deref(), Some("AC weak"));

    let seen_by_bay = bay.jobcards.get(&card.id).await.unwrap();
    assert_eq!(seen_by_bay.complaint.as_deref(), Some("AC weak"));
}

#[tokio::test]
async fn test_invoicing_requires_completion() {
    let app = App::build(&test_config()).unwrap();
    let service = &app.jobcards;
    let card = service.create(draft()).await.unwrap();

    assert!(matches!(
        service.mark_invoiced(&card.id, "INV-1").await,
        Err(ServiceError::Workflow(_))
    ));

    for status in [JobCardStatus::Assigned, JobCardStatus::InProgress, JobCardStatus::Completed] {
        service.update_status(&card.id, status).await.unwrap();
    }

    let invoiced = service.mark_invoiced(&card.id, "INV-1").await.unwrap();
    assert_eq!(invoiced.status, JobCardStatus::Invoiced);
    assert_eq!(invoiced.invoice_number.as_deref(), Some("INV-1"));
    assert!(invoiced.invoice_created_at.is_some());
    assert!(service.engine().is_terminal(invoiced.status));
}

#[tokio::test]
async fn test_completion_publishes_event() {
    let app = App::build(&test_config()).unwrap();
    let service = &app.jobcards;
    let mut events = service.subscribe();

    let card = service.create(draft()).await.unwrap();
    for status in [JobCardStatus::Assigned, JobCardStatus::InProgress, JobCardStatus::Completed] {
        service.update_status(&card.id, status).await.unwrap();
    }

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        JobCardEvent::Completed {
            job_card_id: card.id.clone(),
            lead_id: None,
            status: JobCardStatus::Completed,
        }
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_completion_converts_linked_lead() {
    let app = App::build(&test_config()).unwrap();
    let listener = app.spawn_listeners();

    let lead: Lead = app
        .client
        .post("/leads", &json!({"id": "lead-1", "customerName": "Asha Rao"}), RequestConfig::default())
        .await
        .unwrap()
        .data;
    assert_eq!(lead.status, LeadStatus::New);

    let mut input = draft();
    input.lead_id = Some(lead.id.clone());
    let card = app.jobcards.create(input).await.unwrap();
    for status in [JobCardStatus::Assigned, JobCardStatus::InProgress, JobCardStatus::Completed] {
        app.jobcards.update_status(&card.id, status).await.unwrap();
    }

    let converted = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            app.client.cache().clear();
            let lead: Lead = app
                .client
                .get("/leads/lead-1", RequestConfig::default())
                .await
                .unwrap()
                .data;
            if lead.status == LeadStatus::Converted {
                return lead;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(converted.job_card_id.as_deref(), Some(card.id.as_str()));
    assert!(converted.converted_at.is_some());

    listener.abort();
}

#[tokio::test]
async fn test_raw_client_sees_persisted_wire_shape() {
    let app = App::build(&test_config()).unwrap();
    let card = app.jobcards.create(draft()).await.unwrap();

    let raw: Value = app
        .client
        .get(&format!("/job-cards/{}", card.id), RequestConfig::default())
        .await
        .unwrap()
        .data;

    assert_eq!(raw["status"], "Created");
    assert_eq!(raw["vehicleNumber"], "KA01AB1234");
    assert!(raw.get("startTime").is_none());
}
