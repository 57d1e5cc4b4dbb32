//! Domain DTOs for the waitlist API.
//!
//! # Design
//! Inbound types (`SignupRequest`, `ClientMetadata`) are what callers hand
//! to the client. The wire payload is a separate borrowed view built per
//! call, so optional fields can be dropped without touching the caller's
//! value. Response types mirror the service's JSON envelopes and are
//! returned exactly as decoded.

use serde::{Deserialize, Serialize};

/// Data collected from a signup form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl SignupRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Environment metadata a browser-like host attaches to a signup.
///
/// Supplied per call; server-side callers simply don't pass one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMetadata {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Wire body for `POST /api/v1/signup`.
#[derive(Debug, Serialize)]
pub(crate) struct SignupPayload<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<&'a str>,
}

impl<'a> SignupPayload<'a> {
    /// Empty strings are treated like absent values.
    pub(crate) fn new(request: &'a SignupRequest, metadata: Option<&'a ClientMetadata>) -> Self {
        Self {
            email: &request.email,
            name: non_empty(request.name.as_deref()),
            phone: non_empty(request.phone.as_deref()),
            tags: (!request.tags.is_empty()).then_some(request.tags.as_slice()),
            user_agent: metadata.and_then(|m| non_empty(m.user_agent.as_deref())),
            referrer: metadata.and_then(|m| non_empty(m.referrer.as_deref())),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Wire body for the token-based endpoints (verify, unsubscribe).
#[derive(Debug, Serialize)]
pub(crate) struct TokenPayload<'a> {
    pub token: &'a str,
}

/// One enrollment on the waitlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupEntry {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub position: u64,
    pub is_verified: bool,
    pub created_at: String,
}

/// Successful response to a signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupResponse {
    pub success: bool,
    pub data: SignupEntry,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub project_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfoResponse {
    pub success: bool,
    pub data: ProjectInfo,
}

/// `{success, message}` envelope shared by verify and unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

pub type VerificationResponse = StatusMessage;
pub type UnsubscribeResponse = StatusMessage;

/// Server-side validation failure for a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDetail {
    pub field: String,
    pub message: String,
}
