use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::cache::RequestCache;
use super::error::ApiError;
use super::request::{Method, RawResponse, RequestConfig, RequestDescriptor, Response};
use super::retry::RetryPolicy;
use super::transport::Backend;
use crate::observability::{Metrics, MetricsSnapshot};

/// Defaults applied when a call does not override them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientDefaults {
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Facade every feature module calls through.
///
/// The backend (mock or real) is injected; caching, retries and per-attempt
/// timeouts are applied here so both backends behave the same way.
#[derive(Clone)]
pub struct ApiClient {
    backend: Arc<dyn Backend>,
    cache: Arc<RequestCache>,
    defaults: ClientDefaults,
    metrics: Arc<Metrics>,
}

impl ApiClient {
    pub fn new(backend: Arc<dyn Backend>, cache: Arc<RequestCache>, defaults: ClientDefaults) -> Self {
        Self {
            backend,
            cache,
            defaults,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn cache(&self) -> &Arc<RequestCache> {
        &self.cache
    }

    pub fn defaults(&self) -> ClientDefaults {
        self.defaults
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<Response<T>, ApiError> {
        self.request(Method::Get, path, None, config).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<Response<T>, ApiError> {
        let body = encode_body(body)?;
        self.request(Method::Post, path, body, config).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<Response<T>, ApiError> {
        let body = encode_body(body)?;
        self.request(Method::Put, path, body, config).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<Response<T>, ApiError> {
        let body = encode_body(body)?;
        self.request(Method::Patch, path, body, config).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<Response<T>, ApiError> {
        self.request(Method::Delete, path, None, config).await
    }

    /// Single entry point behind every verb
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        config: RequestConfig,
    ) -> Result<Response<T>, ApiError> {
        self.metrics.request();
        let skip_cache = config.skip_cache;
        let descriptor = self.describe(method, path, body, config);

        let cache_key = (method == Method::Get)
            .then(|| RequestCache::key(&descriptor.path, &descriptor.params));

        if let Some(key) = cache_key.as_deref().filter(|_| !skip_cache) {
            if let Some(hit) = self.cache.get(key) {
                debug!(key, "Cache hit");
                self.metrics.cache_hit();
                return hit.decode();
            }
        }

        let raw = match self.execute(&descriptor).await {
            Ok(raw) => raw,
            Err(err) => {
                self.metrics.failure();
                return Err(err);
            }
        };

        if let Some(key) = cache_key {
            self.cache.insert(key, raw.clone());
        }

        raw.decode()
    }

    fn describe(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        config: RequestConfig,
    ) -> RequestDescriptor {
        RequestDescriptor {
            method,
            path: path.to_string(),
            headers: config.headers,
            body: body.filter(|_| method.allows_body()),
            params: config.params,
            timeout: config.timeout.unwrap_or(self.defaults.timeout),
            retries: config.retries.unwrap_or(self.defaults.retries),
        }
    }

    /// Retry-wrapped backend call, each attempt raced against the deadline
    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, ApiError> {
        let policy = RetryPolicy::new(descriptor.retries, self.defaults.retry_delay);
        let label = format!("{} {}", descriptor.method, descriptor.path);

        policy
            .run(&label, move |attempt| async move {
                self.metrics.backend_call(attempt);
                debug!(
                    backend = self.backend.name(),
                    method = %descriptor.method,
                    path = %descriptor.path,
                    attempt,
                    "Dispatching request"
                );

                match tokio::time::timeout(descriptor.timeout, self.backend.execute(descriptor)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(path = %descriptor.path, timeout = ?descriptor.timeout, "Request timed out");
                        Err(ApiError::timeout(descriptor.timeout))
                    }
                }
            })
            .await
    }
}

/// `()` and `null` mean "no body"
fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Option<Value>, ApiError> {
    let value = serde_json::to_value(body)
        .map_err(|e| ApiError::bad_request(format!("failed to encode request body: {}", e)))?;
    Ok((!value.is_null()).then_some(value))
}
