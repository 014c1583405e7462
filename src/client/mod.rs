//! Typed API client: request building, caching, retries and the backend switch

pub mod api;
pub mod cache;
pub mod error;
pub mod mock;
pub mod request;
pub mod retry;
pub mod transport;

pub use api::{ApiClient, ClientDefaults};
pub use cache::RequestCache;
pub use error::{ApiError, ErrorCode};
pub use mock::{MockBackend, MockHandler, MockRegistry, MockRequest, PathParams, PathPattern, Routed};
pub use request::{HeadersMap, Method, QueryParams, QueryValue, RawResponse, RequestConfig, RequestDescriptor, Response};
pub use retry::RetryPolicy;
pub use transport::{Backend, HttpSettings, HttpTransport};
