//! Error taxonomy shared by every backend.
//!
//! Whatever goes wrong below the [`ApiClient`](super::ApiClient) surfaces as a
//! single [`ApiError`] carrying the HTTP status (0 when no response was
//! received), a short machine code and optional structured details.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Machine-readable error code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Network,
    Timeout,
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    Server,
    Http,
    Decode,
    /// Code supplied verbatim by a backend
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::Network => "NETWORK_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::Server => "SERVER_ERROR",
            ErrorCode::Http => "HTTP_ERROR",
            ErrorCode::Decode => "DECODE_ERROR",
            ErrorCode::Other(code) => code,
        }
    }

    /// Codes that describe a missing response rather than an answer
    pub fn is_transport(&self) -> bool {
        matches!(self, ErrorCode::Network | ErrorCode::Timeout)
    }

    /// Parse a code received on the wire
    pub fn from_wire(code: &str) -> Self {
        match code {
            "NETWORK_ERROR" => ErrorCode::Network,
            "TIMEOUT" => ErrorCode::Timeout,
            "VALIDATION_ERROR" => ErrorCode::Validation,
            "NOT_FOUND" => ErrorCode::NotFound,
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            "FORBIDDEN" => ErrorCode::Forbidden,
            "CONFLICT" => ErrorCode::Conflict,
            "SERVER_ERROR" => ErrorCode::Server,
            "HTTP_ERROR" => ErrorCode::Http,
            "DECODE_ERROR" => ErrorCode::Decode,
            other => ErrorCode::Other(other.to_string()),
        }
    }

    /// Code implied by an HTTP status when the body carries none
    pub fn for_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorCode::Validation,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            500..=599 => ErrorCode::Server,
            _ => ErrorCode::Http,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(ErrorCode::from_wire(&code))
    }
}

/// The one error type returned by the client
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code} ({status}): {message}")]
pub struct ApiError {
    pub status: u16,
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error body as rendered by backends: `{code, message, details}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<Value>,
}

impl ApiError {
    pub fn new(status: u16, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, ErrorCode::Network, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            0,
            ErrorCode::Timeout,
            format!("request timed out after {}ms", after.as_millis()),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(422, ErrorCode::Validation, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, ErrorCode::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, ErrorCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, ErrorCode::Server, message)
    }

    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, ErrorCode::Decode, message)
    }

    /// Build from a non-2xx response.
    ///
    /// A JSON body of the form `{code, message, details}` takes precedence;
    /// anything else falls back to a status-derived code with the raw body
    /// text kept in `details`.
    pub fn from_response(status: u16, status_text: &str, body: &[u8]) -> Self {
        if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
            if parsed.code.is_some() || parsed.message.is_some() {
                let code = parsed
                    .code
                    .as_deref()
                    .map(ErrorCode::from_wire)
                    .filter(|code| !code.is_transport())
                    .unwrap_or_else(|| ErrorCode::for_status(status));
                let message = parsed
                    .message
                    .unwrap_or_else(|| format!("HTTP {} {}", status, status_text));
                return Self {
                    status,
                    code,
                    message,
                    details: parsed.details,
                };
            }
        }

        let mut error = Self::new(
            status,
            ErrorCode::for_status(status),
            format!("HTTP {} {}", status, status_text),
        );
        if !body.is_empty() {
            let text = String::from_utf8_lossy(body).into_owned();
            error.details = Some(serde_json::from_slice(body).unwrap_or(Value::String(text)));
        }
        error
    }

    /// Transport-level failures (no response or timed out) are the only
    /// retryable class. Anything carrying a status was answered by a server.
    pub fn is_retryable(&self) -> bool {
        self.status == 0 && self.code.is_transport()
    }

    /// The error as a server would answer it. A handler that fails without
    /// a status becomes a 502 so that it is never retried as a transport
    /// failure.
    pub fn answered(self) -> Self {
        if self.status != 0 {
            return self;
        }
        Self {
            status: 502,
            code: ErrorCode::for_status(502),
            ..self
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404 || self.code == ErrorCode::NotFound
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::new(0, ErrorCode::Timeout, err.to_string());
        }
        if err.is_decode() {
            let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
            return Self::decode(status, err.to_string());
        }
        Self::network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::bad_request(value.to_string())
    }
}
