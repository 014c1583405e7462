//! Real transport against the mock registry served over HTTP

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt; // for `oneshot`

use workshop::app::{App, mock_registry};
use workshop::client::{
    ApiClient, ApiError, ClientDefaults, ErrorCode, HttpSettings, HttpTransport, Method, MockRegistry,
    MockRequest, RequestCache, RequestConfig,
};
use workshop::config::{Config, HumanDuration};
use workshop::jobcards::{JobCardDraft, ServiceError};
use workshop::server;
use workshop::store::MemoryStore;
use workshop::workflow::JobCardStatus;

/// Serve `router` on an ephemeral port and return its address
async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service()).await.unwrap();
    });

    addr
}

fn transport(addr: SocketAddr) -> Arc<HttpTransport> {
    Arc::new(
        HttpTransport::new(HttpSettings {
            base_url: format!("http://{}/api", addr),
            ..Default::default()
        })
        .unwrap(),
    )
}

fn http_client(addr: SocketAddr, retries: u32) -> ApiClient {
    ApiClient::new(
        transport(addr),
        Arc::new(RequestCache::new()),
        ClientDefaults {
            timeout: Duration::from_secs(5),
            retries,
            retry_delay: Duration::from_millis(5),
        },
    )
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.client.retries = 1;
    config.client.retry_delay = HumanDuration::from_millis(5);
    config
}

#[tokio::test]
async fn test_job_card_flow_over_http() {
    let registry = mock_registry(Arc::new(MemoryStore::new()));
    let addr = spawn_server(server::router(registry, "/api")).await;
    let app = App::with_backend(transport(addr), &test_config());

    let card = app
        .jobcards
        .create(
            JobCardDraft::builder()
                .customer_name("Imran".to_string())
                .vehicle_number("MH12XY9876".to_string())
                .build(),
        )
        .await
        .unwrap();

    for status in [JobCardStatus::Assigned, JobCardStatus::InProgress, JobCardStatus::Completed] {
        app.jobcards.update_status(&card.id, status).await.unwrap();
    }

    let done = app.jobcards.get(&card.id).await.unwrap();
    assert_eq!(done.status, JobCardStatus::Completed);
    assert!(done.start_time.is_some());
    assert!(done.completed_at.is_some());

    let listed = app.jobcards.list(Some(JobCardStatus::Completed)).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_not_found_maps_to_service_error() {
    let registry = mock_registry(Arc::new(MemoryStore::new()));
    let addr = spawn_server(server::router(registry, "/api")).await;
    let app = App::with_backend(transport(addr), &test_config());

    let err = app.jobcards.get("missing").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(id) if id == "missing"));
}

#[tokio::test]
async fn test_server_error_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let mut registry = MockRegistry::new();
    registry.register(Method::Get, "/job-cards", move |_req: MockRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        async {
            Err::<Value, _>(ApiError::internal("database unavailable").with_details(json!({"retryAfter": 30})))
        }
    });

    let addr = spawn_server(server::router(registry, "/api")).await;
    let api = http_client(addr, 3);

    let err = api
        .get::<Value>("/job-cards", RequestConfig::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, 500);
    assert_eq!(err.code, ErrorCode::Server);
    assert_eq!(err.message, "database unavailable");
    assert_eq!(err.details, Some(json!({"retryAfter": 30})));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_timeout_answered_as_gateway_error() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let mut registry = MockRegistry::new();
    registry.register(Method::Get, "/job-cards", move |_req: MockRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err::<Value, _>(ApiError::timeout(Duration::from_secs(30))) }
    });

    let addr = spawn_server(server::router(registry, "/api")).await;
    let api = http_client(addr, 3);

    let err = api
        .get::<Value>("/job-cards", RequestConfig::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, 502);
    assert_eq!(err.code, ErrorCode::Server);
    assert!(!err.is_retryable());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ids_outside_one_segment_rejected_in_both_modes() {
    let registry = mock_registry(Arc::new(MemoryStore::new()));
    let addr = spawn_server(server::router(registry, "/api")).await;
    let http = App::with_backend(transport(addr), &test_config());
    let mock = App::build(&test_config()).unwrap();

    for app in [&http, &mock] {
        for id in ["jc#1", "jc?1", "a/b", "jc 1"] {
            let mut draft = JobCardDraft::builder()
                .customer_name("Imran".to_string())
                .vehicle_number("MH12XY9876".to_string())
                .build();
            draft.id = Some(id.to_string());

            assert!(matches!(app.jobcards.create(draft).await, Err(ServiceError::Invalid(_))), "{:?}", id);
            assert!(matches!(app.jobcards.get(id).await, Err(ServiceError::Invalid(_))), "{:?}", id);
        }
        assert_eq!(app.client.metrics().backend_calls, 0);

        let mut draft = JobCardDraft::builder()
            .customer_name("Imran".to_string())
            .vehicle_number("MH12XY9876".to_string())
            .build();
        draft.id = Some("jc-7.a~b".to_string());
        let card = app.jobcards.create(draft).await.unwrap();

        let fetched = app.jobcards.get(&card.id).await.unwrap();
        assert_eq!(fetched.id, "jc-7.a~b");
        let started = app.jobcards.update_status(&card.id, JobCardStatus::Assigned).await.unwrap();
        assert_eq!(started.status, JobCardStatus::Assigned);
    }
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let api = http_client(addr, 2);
    let err = api
        .get::<Value>("/leads", RequestConfig::default())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Network);
    assert_eq!(err.status, 0);
    assert_eq!(api.metrics().backend_calls, 3);
}

#[tokio::test]
async fn test_query_and_headers_reach_handler() {
    let mut registry = MockRegistry::new();
    registry.register(Method::Get, "/echo", |req: MockRequest| async move {
        Ok::<_, ApiError>(json!({
            "status": req.query.get("status").map(|v| v.to_string()),
            "tenant": req.headers.get("x-tenant"),
            "auth": req.headers.get("authorization"),
        }))
    });

    let addr = spawn_server(server::router(registry, "/api")).await;
    let transport = HttpTransport::new(HttpSettings {
        base_url: format!("http://{}/api", addr),
        auth_token: Some("secret-token".to_string()),
        ..Default::default()
    })
    .unwrap();
    let api = ApiClient::new(Arc::new(transport), Arc::new(RequestCache::new()), ClientDefaults::default());

    let config = RequestConfig::default()
        .with_param("status", "Parts Pending")
        .with_header("x-tenant", "north");
    let response = api.get::<Value>("/echo", config).await.unwrap();

    assert_eq!(
        response.data,
        json!({"status": "Parts Pending", "tenant": "north", "auth": "Bearer secret-token"})
    );
}

#[tokio::test]
async fn test_router_health() {
    let app = server::router(MockRegistry::new(), "/api");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_router_post_is_created() {
    let app = server::router(mock_registry(Arc::new(MemoryStore::new())), "/api");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/leads")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"id": "l-1", "customerName": "Asha"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_router_unknown_route_renders_error() {
    let app = server::router(MockRegistry::new(), "/api");

    let response = app
        .oneshot(Request::builder().uri("/api/invoices/7").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["message"].as_str().unwrap().contains("/invoices/7"));
}

#[tokio::test]
async fn test_router_rejects_reserved_id_on_create() {
    let app = server::router(mock_registry(Arc::new(MemoryStore::new())), "/api");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/job-cards")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"id": "jc#1"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_router_rejects_malformed_json() {
    let app = server::router(mock_registry(Arc::new(MemoryStore::new())), "/api");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/job-cards")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
