//! Stateless HTTP request builder and response parser for the waitlist API.
//!
//! # Design
//! `WaitlistClient` holds only its validated configuration and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. The caller executes the HTTP round-trip, keeping this
//! half deterministic and free of I/O.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::{ClientConfig, ConfigError};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    ClientMetadata, ProjectInfoResponse, SignupPayload, SignupRequest, SignupResponse,
    TokenPayload, UnsubscribeResponse, VerificationResponse,
};

pub const SIGNUP_PATH: &str = "/api/v1/signup";
pub const PROJECT_PATH: &str = "/api/v1/project";
pub const VERIFY_PATH: &str = "/api/v1/verify";
pub const UNSUBSCRIBE_PATH: &str = "/api/v1/unsubscribe";

/// Synchronous, stateless client for the waitlist API.
#[derive(Debug, Clone)]
pub struct WaitlistClient {
    config: ClientConfig,
    base_url: Url,
}

impl WaitlistClient {
    /// Validate `config` and build a client from it.
    ///
    /// The API key must be non-empty; its format is the service's business.
    /// Zero-valued settings are replaced by their defaults.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let config = config.normalized();
        if config.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        let base_url = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "URL cannot carry a path".to_string(),
            });
        }
        Ok(Self { config, base_url })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for `path` with the API key attached as a query parameter.
    pub fn endpoint(&self, path: &str) -> String {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{path}"));
        url.query_pairs_mut().append_pair("api_key", &self.config.api_key);
        url.into()
    }

    fn get(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(path),
            headers: Vec::new(),
            body: None,
            timeout: self.config.timeout,
        }
    }

    fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::encode(&e))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(path),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
            timeout: self.config.timeout,
        })
    }

    /// Build a signup request. `metadata` is attached to this request only.
    pub fn build_signup(
        &self,
        request: &SignupRequest,
        metadata: Option<&ClientMetadata>,
    ) -> Result<HttpRequest, ApiError> {
        self.post_json(SIGNUP_PATH, &SignupPayload::new(request, metadata))
    }

    pub fn build_project_info(&self) -> HttpRequest {
        self.get(PROJECT_PATH)
    }

    pub fn build_verify_email(&self, token: &str) -> Result<HttpRequest, ApiError> {
        self.post_json(VERIFY_PATH, &TokenPayload { token })
    }

    pub fn build_unsubscribe(&self, token: &str) -> Result<HttpRequest, ApiError> {
        self.post_json(UNSUBSCRIBE_PATH, &TokenPayload { token })
    }

    pub fn parse_signup(&self, response: HttpResponse) -> Result<SignupResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_project_info(
        &self,
        response: HttpResponse,
    ) -> Result<ProjectInfoResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_verify_email(
        &self,
        response: HttpResponse,
    ) -> Result<VerificationResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_unsubscribe(
        &self,
        response: HttpResponse,
    ) -> Result<UnsubscribeResponse, ApiError> {
        parse_json(response)
    }
}

/// Decode any 2xx body as `T`; normalize everything else.
fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::from_response(&response));
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::decode(response.status, &e))
}
