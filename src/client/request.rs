use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use super::error::ApiError;

pub type HeadersMap = BTreeMap<String, String>;
pub type QueryParams = BTreeMap<String, QueryValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// GET and DELETE never carry a body
    pub fn allows_body(&self) -> bool {
        !matches!(self, Method::Get | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(ApiError::new(
                405,
                super::error::ErrorCode::Http,
                format!("unsupported method: {}", other),
            )),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Primitive query-string value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Bool(v) => write!(f, "{}", v),
            QueryValue::Int(v) => write!(f, "{}", v),
            QueryValue::Float(v) => write!(f, "{}", v),
            QueryValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

/// Per-call overrides. Unset fields fall back to client defaults.
#[derive(Debug, Clone, Default, bon::Builder)]
pub struct RequestConfig {
    #[builder(default)]
    pub params: QueryParams,
    #[builder(default)]
    pub headers: HeadersMap,
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    /// Skip the cache lookup for a GET. The response still refreshes the
    /// cached entry.
    #[builder(default)]
    pub skip_cache: bool,
}

impl RequestConfig {
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }
}

/// Fully resolved request handed to a backend
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub headers: HeadersMap,
    pub body: Option<Value>,
    pub params: QueryParams,
    pub timeout: Duration,
    pub retries: u32,
}

impl RequestDescriptor {
    /// Query string without the leading `?`, keys in sorted order
    pub fn query_string(&self) -> String {
        encode_query(&self.params)
    }
}

/// Append `params` to `url` as form-encoded pairs in key order
pub(crate) fn append_query(url: &mut Url, params: &QueryParams) {
    if params.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (key, value) in params {
        pairs.append_pair(key, &value.to_string());
    }
}

/// The query string [`append_query`] would produce
pub(crate) fn encode_query(params: &QueryParams) -> String {
    let Ok(mut scratch) = Url::parse("http://localhost/") else {
        return String::new();
    };
    append_query(&mut scratch, params);
    scratch.query().unwrap_or_default().to_string()
}

/// Response envelope returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<T> {
    pub data: T,
    pub status: u16,
    pub status_text: String,
    #[serde(default)]
    pub headers: HeadersMap,
}

/// Backend-level response before decoding into the caller's type
pub type RawResponse = Response<Value>;

impl RawResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            status: 200,
            status_text: "OK".to_string(),
            headers: HeadersMap::new(),
        }
    }

    pub fn created(data: Value) -> Self {
        Self {
            data,
            status: 201,
            status_text: "Created".to_string(),
            headers: HeadersMap::new(),
        }
    }

    /// Decode the payload into the caller's type. The shape is not validated
    /// beyond what deserialization requires.
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<Response<T>, ApiError> {
        let data = serde_json::from_value(self.data).map_err(|e| {
            ApiError::decode(self.status, format!("unexpected response payload: {}", e))
        })?;

        Ok(Response {
            data,
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
        })
    }
}
