//! Mock backend: a table of (method, path pattern) → handler
//!
//! Handlers are installed at start-up and simulate the real API. Patterns use
//! `:name` placeholders (`/job-cards/:id/assign-engineer`), the same syntax the
//! route catalogue uses when building concrete paths.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::cache::normalize_path;
use super::error::ApiError;
use super::request::{HeadersMap, Method, QueryParams, RawResponse, RequestDescriptor};
use crate::routes::{Endpoint, RouteId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Parsed path pattern with `:param` placeholders
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

pub type PathParams = BTreeMap<String, String>;

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let raw = normalize_path(pattern);
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(s.to_string()),
            })
            .collect();

        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Bind placeholders against a concrete path, `None` if it does not match
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let concrete = normalize_path(path);
        let parts: Vec<&str> = concrete.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }

    fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }
}

/// Request as seen by a mock handler
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: Method,
    /// Concrete path with placeholders already substituted
    pub path: String,
    pub params: PathParams,
    pub query: QueryParams,
    pub headers: HeadersMap,
    pub body: Option<Value>,
}

impl MockRequest {
    /// Bound path parameter, 400 if the pattern did not declare it
    pub fn param(&self, name: &str) -> Result<&str, ApiError> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::bad_request(format!("missing path parameter: {}", name)))
    }

    /// Deserialize the body, treating an absent body as `null`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = self.body.clone().unwrap_or(Value::Null);
        serde_json::from_value(body)
            .map_err(|e| ApiError::bad_request(format!("invalid request body: {}", e)))
    }
}

#[async_trait]
pub trait MockHandler: Send + Sync {
    async fn handle(&self, request: MockRequest) -> Result<Value, ApiError>;
}

/// Adapter turning an async closure into a [`MockHandler`]
struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MockHandler for FnHandler<F>
where
    F: Fn(MockRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
{
    async fn handle(&self, request: MockRequest) -> Result<Value, ApiError> {
        (self.0)(request).await
    }
}

/// Typed request handed to handlers registered through [`MockRegistry::route`]
#[derive(Debug, Clone)]
pub struct Routed<B> {
    pub params: PathParams,
    pub query: QueryParams,
    pub body: B,
}

impl<B> Routed<B> {
    pub fn param(&self, name: &str) -> Result<&str, ApiError> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::bad_request(format!("missing path parameter: {}", name)))
    }
}

struct TypedHandler<E, H> {
    handler: H,
    _endpoint: PhantomData<fn() -> E>,
}

#[async_trait]
impl<E, H, Fut> MockHandler for TypedHandler<E, H>
where
    E: Endpoint,
    H: Fn(Routed<E::Body>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<E::Reply, ApiError>> + Send + 'static,
{
    async fn handle(&self, request: MockRequest) -> Result<Value, ApiError> {
        let body: E::Body = request.json()?;
        let routed = Routed {
            params: request.params,
            query: request.query,
            body,
        };
        let reply = (self.handler)(routed).await?;
        serde_json::to_value(reply)
            .map_err(|e| ApiError::internal(format!("failed to encode reply: {}", e)))
    }
}

/// Registration table. At most one handler per (method, pattern).
#[derive(Clone, Default)]
pub struct MockRegistry {
    handlers: BTreeMap<(Method, PathPattern), Arc<dyn MockHandler>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async closure; a later registration for the same key
    /// replaces it
    pub fn register<F, Fut>(&mut self, method: Method, pattern: &str, handler: F)
    where
        F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
    {
        self.register_handler(method, pattern, Arc::new(FnHandler(handler)));
    }

    pub fn register_handler(&mut self, method: Method, pattern: &str, handler: Arc<dyn MockHandler>) {
        let pattern = PathPattern::parse(pattern);
        debug!(%method, pattern = pattern.as_str(), "Registered mock handler");
        self.handlers.insert((method, pattern), handler);
    }

    /// Register a handler for a catalogued route with typed body and reply
    pub fn route<E, H, Fut>(&mut self, handler: H)
    where
        E: Endpoint + 'static,
        H: Fn(Routed<E::Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<E::Reply, ApiError>> + Send + 'static,
    {
        let route: RouteId = E::ROUTE;
        self.register_handler(
            route.method(),
            route.pattern(),
            Arc::new(TypedHandler::<E, H> {
                handler,
                _endpoint: PhantomData,
            }),
        );
    }

    pub fn has_handler(&self, method: Method, pattern: &str) -> bool {
        self.handlers
            .contains_key(&(method, PathPattern::parse(pattern)))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Most specific match: the candidate with the most literal segments
    pub fn resolve(&self, method: Method, path: &str) -> Option<(Arc<dyn MockHandler>, PathParams)> {
        self.handlers
            .iter()
            .filter(|((m, _), _)| *m == method)
            .filter_map(|((_, pattern), handler)| {
                pattern
                    .matches(path)
                    .map(|params| (pattern.literal_count(), handler.clone(), params))
            })
            .max_by_key(|(literals, _, _)| *literals)
            .map(|(_, handler, params)| (handler, params))
    }

    /// Resolve and invoke the handler for a request
    pub async fn dispatch(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        let (handler, params) = self.resolve(request.method, &request.path).ok_or_else(|| {
            ApiError::not_found(format!(
                "no mock handler for {} {}",
                request.method, request.path
            ))
        })?;

        let mock_request = MockRequest {
            method: request.method,
            path: normalize_path(&request.path),
            params,
            query: request.params.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        };

        handler.handle(mock_request).await
    }
}

/// [`Backend`](super::transport::Backend) that answers from a [`MockRegistry`]
pub struct MockBackend {
    registry: MockRegistry,
    latency: Duration,
}

impl MockBackend {
    pub fn new(registry: MockRegistry) -> Self {
        Self {
            registry,
            latency: Duration::ZERO,
        }
    }

    /// Simulated network latency applied before every dispatch
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn registry(&self) -> &MockRegistry {
        &self.registry
    }
}

#[async_trait]
impl super::transport::Backend for MockBackend {
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let data = self
            .registry
            .dispatch(request)
            .await
            .map_err(ApiError::answered)?;
        Ok(match request.method {
            Method::Post => RawResponse::created(data),
            _ => RawResponse::ok(data),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
