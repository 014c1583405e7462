//! Serves the mock registry over HTTP so a real-mode client can run against it

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::client::{ApiError, HeadersMap, Method, MockRegistry, QueryParams, QueryValue, RequestDescriptor};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Clone)]
struct MockState {
    registry: Arc<MockRegistry>,
    prefix: Arc<str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.answered();
        let status = StatusCode::from_u16(error.status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY);

        let body = json!({
            "code": error.code.as_str(),
            "message": error.message,
            "details": error.details,
        });

        (status, Json(body)).into_response()
    }
}

/// Router answering every request under `prefix` from the registry
pub fn router(registry: MockRegistry, prefix: &str) -> Router {
    let state = MockState {
        registry: Arc::new(registry),
        prefix: Arc::from(prefix.trim_end_matches('/')),
    };

    Router::new()
        .route("/health", get(health))
        .fallback(dispatch)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(address: SocketAddr, registry: MockRegistry, prefix: &str) -> Result<(), AnyError> {
    let app = router(registry, prefix);

    let listener = TcpListener::bind(address).await?;
    info!(%address, prefix, "Mock API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn dispatch(
    State(state): State<MockState>,
    method: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let method: Method = method.as_str().parse()?;

    let path = uri
        .path()
        .strip_prefix(state.prefix.as_ref())
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .ok_or_else(|| ApiError::not_found(format!("no route for {}", uri.path())))?;

    let body = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice::<Value>(&body)?)
    };

    let request = RequestDescriptor {
        method,
        path: path.to_string(),
        headers: collect_headers(&headers),
        body,
        params: parse_query(uri.query()),
        timeout: Duration::ZERO,
        retries: 0,
    };

    let data = state.registry.dispatch(&request).await?;
    let status = if method == Method::Post {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(data)).into_response())
}

fn parse_query(query: Option<&str>) -> QueryParams {
    let Some(query) = query else {
        return QueryParams::new();
    };

    reqwest::Url::parse(&format!("http://mock/?{}", query))
        .map(|url| {
            url.query_pairs()
                .map(|(k, v)| (k.into_owned(), QueryValue::Text(v.into_owned())))
                .collect()
        })
        .unwrap_or_default()
}

fn collect_headers(headers: &HeaderMap) -> HeadersMap {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
