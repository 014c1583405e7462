//! Backend strategy and the real HTTP transport

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url, header};
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

use super::error::ApiError;
use super::request::{HeadersMap, RawResponse, RequestDescriptor, append_query};

/// Something that can execute a resolved request.
///
/// The [`ApiClient`](super::ApiClient) holds one of these by reference and
/// applies caching, retries and timeouts on top, so implementations only
/// perform a single attempt.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, ApiError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// HTTP transport settings
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub auth_token: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            user_agent: "workshop/0.1.0".to_string(),
            auth_token: None,
        }
    }
}

/// `reqwest`-backed transport for real mode
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    auth_token: RwLock<Option<String>>,
}

impl HttpTransport {
    pub fn new(settings: HttpSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            ApiError::bad_request(format!("invalid base URL {}: {}", settings.base_url, e))
        })?;

        // Per-request deadlines are enforced by the ApiClient, only the
        // connect phase is bounded here.
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            auth_token: RwLock::new(settings.auth_token),
        })
    }

    /// Replace (or clear) the bearer token used for subsequent requests
    pub fn set_auth_token(&self, token: Option<String>) {
        let mut slot = self.auth_token.write().unwrap_or_else(|e| e.into_inner());
        *slot = token;
    }

    fn auth_token(&self) -> Option<String> {
        self.auth_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Join the base URL and a logical route, keeping the base path. Each
    /// route segment is escaped on its own.
    pub fn url_for(&self, request: &RequestDescriptor) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::bad_request(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(request.path.split('/').filter(|segment| !segment.is_empty()));

        append_query(&mut url, &request.params);
        Ok(url)
    }
}

#[async_trait]
impl Backend for HttpTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, ApiError> {
        let url = self.url_for(request)?;
        debug!(method = %request.method, %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .header(header::ACCEPT, "application/json");

        if let Some(token) = self.auth_token() {
            builder = builder.bearer_auth(token);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body.as_ref().filter(|_| request.method.allows_body()) {
            let encoded = serde_json::to_vec(body)?;
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(encoded);
        }

        let response = builder.send().await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &status_text, &body));
        }

        let data = decode_body(status.as_u16(), headers.get("content-type"), &body)?;
        debug!(status = status.as_u16(), size = body.len(), "Response received");

        Ok(RawResponse {
            data,
            status: status.as_u16(),
            status_text,
            headers,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn collect_headers(headers: &header::HeaderMap) -> HeadersMap {
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

/// Decode a success body. Empty bodies become `null`; anything that is not
/// declared as JSON is rejected.
pub fn decode_body(status: u16, content_type: Option<&String>, body: &Bytes) -> Result<Value, ApiError> {
    if body.is_empty() {
        return Ok(Value::Null);
    }

    if let Some(content_type) = content_type {
        parse_content_type(content_type).map_err(|e| ApiError::decode(status, e))?;
    }

    serde_json::from_slice(body)
        .map_err(|e| ApiError::decode(status, format!("invalid JSON body: {}", e)))
}

/// Accepts `application/json` and `+json` suffixed media types
pub fn parse_content_type(content_type: &str) -> Result<mime::Mime, String> {
    let media_type: mime::Mime = content_type
        .parse()
        .map_err(|_| format!("invalid Content-Type: {}", content_type))?;

    let is_json = media_type.type_() == mime::APPLICATION
        && (media_type.subtype() == mime::JSON || media_type.suffix() == Some(mime::JSON));

    if !is_json {
        return Err(format!(
            "expected a JSON response, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        ));
    }

    Ok(media_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::request::{Method, QueryParams, QueryValue};
    use serde_json::json;

    fn descriptor(path: &str, params: QueryParams) -> RequestDescriptor {
        RequestDescriptor {
            method: Method::Get,
            path: path.to_string(),
            headers: HeadersMap::new(),
            body: None,
            params,
            timeout: Duration::from_secs(1),
            retries: 0,
        }
    }

    #[test]
    fn test_url_keeps_base_path() {
        let transport = HttpTransport::new(HttpSettings {
            base_url: "http://localhost:3000/api/".to_string(),
            ..Default::default()
        })
        .unwrap();

        let mut params = QueryParams::new();
        params.insert("status".into(), QueryValue::from("Parts Pending"));

        let url = transport.url_for(&descriptor("/job-cards", params)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/job-cards?status=Parts+Pending"
        );
    }

    #[test]
    fn test_url_escapes_each_segment_and_pair() {
        let transport = HttpTransport::new(HttpSettings {
            base_url: "http://localhost:3000".to_string(),
            ..Default::default()
        })
        .unwrap();

        let mut params = QueryParams::new();
        params.insert("q".into(), QueryValue::from("a&b=c"));

        let url = transport.url_for(&descriptor("/leads/l 1", params)).unwrap();
        assert_eq!(url.path(), "/leads/l%201");
        assert_eq!(url.query(), Some("q=a%26b%3Dc"));
        assert_eq!(url.query_pairs().next().unwrap().1, "a&b=c");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = HttpTransport::new(HttpSettings {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_content_type() {
        assert!(parse_content_type("application/json").is_ok());
        assert!(parse_content_type("application/json; charset=utf-8").is_ok());
        assert!(parse_content_type("application/problem+json").is_ok());
        assert!(parse_content_type("text/html").is_err());
        assert!(parse_content_type("garbage").is_err());
    }

    #[test]
    fn test_decode_body() {
        let json_type = "application/json".to_string();
        let html_type = "text/html".to_string();

        assert_eq!(decode_body(204, None, &Bytes::new()).unwrap(), Value::Null);
        assert_eq!(
            decode_body(200, Some(&json_type), &Bytes::from_static(b"{\"a\":1}")).unwrap(),
            json!({"a": 1})
        );
        assert!(decode_body(200, Some(&html_type), &Bytes::from_static(b"<html>")).is_err());
        assert!(decode_body(200, Some(&json_type), &Bytes::from_static(b"{oops")).is_err());
    }
}
