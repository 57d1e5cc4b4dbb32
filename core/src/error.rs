//! Error types for the waitlist API client.
//!
//! # Design
//! Every failure a caller can observe is an `ApiError`, whether it came from
//! the network, from a non-2xx status, or from a body that would not decode.
//! The public fields mirror the service's error envelope so a UI can show
//! `error`/`message` and highlight fields from `details` without caring
//! where the failure originated.
//!
//! When the service omits `message`, it stays `None`. The local reason for
//! failures that never reached the service (timeouts, refused connections,
//! undecodable bodies) is kept in `cause`, which is never serialized.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::http::HttpResponse;
use crate::types::FieldDetail;

/// Fallback for `ApiError::error` when the service supplied none.
pub const DEFAULT_ERROR: &str = "Request failed";

/// Normalized failure of a waitlist API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub error: String,
    pub message: Option<String>,
    /// HTTP status of the last attempt; `None` when no response arrived.
    pub status: Option<u16>,
    pub details: Option<Vec<FieldDetail>>,
    pub cause: Option<ErrorCause>,
}

/// Local reason behind an `ApiError` that has no service-provided text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorCause {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("response body did not decode: {0}")]
    Decode(String),

    #[error("request body did not encode: {0}")]
    Encode(String),
}

/// Failure to complete an HTTP round-trip at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport failure: {0}")]
    Io(String),
}

impl ApiError {
    fn bare(status: Option<u16>, cause: Option<ErrorCause>) -> Self {
        Self {
            error: DEFAULT_ERROR.to_string(),
            message: None,
            status,
            details: None,
            cause,
        }
    }

    /// Normalize a non-2xx response.
    ///
    /// `error` and `message` are taken from the JSON body only when they are
    /// strings; `details` only when every entry is a `{field, message}` pair.
    pub fn from_response(response: &HttpResponse) -> Self {
        let mut err = Self::bare(Some(response.status), None);
        let Ok(Value::Object(body)) = serde_json::from_str::<Value>(&response.body) else {
            return err;
        };

        if let Some(Value::String(error)) = body.get("error") {
            err.error = error.clone();
        }
        if let Some(Value::String(message)) = body.get("message") {
            err.message = Some(message.clone());
        }
        err.details = body
            .get("details")
            .cloned()
            .and_then(|details| serde_json::from_value::<Vec<FieldDetail>>(details).ok());
        err
    }

    pub fn from_transport(err: TransportError) -> Self {
        Self::bare(None, Some(ErrorCause::Transport(err)))
    }

    /// A 2xx response whose body did not match the expected shape.
    pub fn decode(status: u16, err: &serde_json::Error) -> Self {
        Self::bare(Some(status), Some(ErrorCause::Decode(err.to_string())))
    }

    pub fn encode(err: &serde_json::Error) -> Self {
        Self::bare(None, Some(ErrorCause::Encode(err.to_string())))
    }

    /// 4xx: the request itself was rejected and repeating it won't help.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status, Some(400..=499))
    }

    /// Message for the given field from the server's `details`, if any.
    pub fn field_message(&self, field: &str) -> Option<&str> {
        self.details
            .as_deref()?
            .iter()
            .find(|d| d.field == field)
            .map(|d| d.message.as_str())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.error)?,
            None => write!(f, "{}", self.error)?,
        }
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &(dyn std::error::Error + 'static))
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        Self::from_transport(err)
    }
}

/// Serializes as the service's error envelope, `success` always `false`.
impl Serialize for ApiError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            success: bool,
            error: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            message: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            status: Option<u16>,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<&'a [FieldDetail]>,
        }

        Envelope {
            success: false,
            error: &self.error,
            message: self.message.as_deref(),
            status: self.status,
            details: self.details.as_deref(),
        }
        .serialize(serializer)
    }
}
