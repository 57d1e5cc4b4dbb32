//! Async waitlist client with retries.
//!
//! # Design
//! `Waitlist` glues the sans-IO `WaitlistClient` to a `Transport` and runs
//! the `RetryPolicy`. A call builds its request once, then sends clones of it
//! one attempt at a time: the next attempt starts only after the previous one
//! failed and its backoff fully elapsed. Nothing is shared between calls
//! except the immutable configuration, so one `Waitlist` can serve many
//! concurrent calls. Dropping a call's future abandons the in-flight attempt
//! and any pending backoff.

use std::time::Duration;

use tracing::debug;

use crate::client::WaitlistClient;
use crate::config::{ClientConfig, ConfigError};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::retry::RetryPolicy;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    ClientMetadata, ProjectInfoResponse, SignupRequest, SignupResponse, UnsubscribeResponse,
    VerificationResponse,
};

#[derive(Debug, Clone)]
pub struct Waitlist<T = ReqwestTransport> {
    client: WaitlistClient,
    policy: RetryPolicy,
    transport: T,
}

impl Waitlist<ReqwestTransport> {
    /// Client for the production endpoint with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_config(ClientConfig::new(api_key))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::with_transport(config, ReqwestTransport::new()?)
    }
}

impl<T: Transport> Waitlist<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ConfigError> {
        let client = WaitlistClient::new(config)?;
        Ok(Self {
            policy: RetryPolicy::from_config(client.config()),
            client,
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.client.config()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `POST /api/v1/signup` without browser metadata.
    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        let req = self.client.build_signup(request, None)?;
        self.send(req, WaitlistClient::parse_signup).await
    }

    /// `POST /api/v1/signup` with the host's user agent and referrer.
    pub async fn signup_with_metadata(
        &self,
        request: &SignupRequest,
        metadata: &ClientMetadata,
    ) -> Result<SignupResponse, ApiError> {
        let req = self.client.build_signup(request, Some(metadata))?;
        self.send(req, WaitlistClient::parse_signup).await
    }

    pub async fn project_info(&self) -> Result<ProjectInfoResponse, ApiError> {
        let req = self.client.build_project_info();
        self.send(req, WaitlistClient::parse_project_info).await
    }

    pub async fn verify_email(&self, token: &str) -> Result<VerificationResponse, ApiError> {
        let req = self.client.build_verify_email(token)?;
        self.send(req, WaitlistClient::parse_verify_email).await
    }

    pub async fn unsubscribe(&self, token: &str) -> Result<UnsubscribeResponse, ApiError> {
        let req = self.client.build_unsubscribe(token)?;
        self.send(req, WaitlistClient::parse_unsubscribe).await
    }

    async fn send<R, F>(&self, request: HttpRequest, parse: F) -> Result<R, ApiError>
    where
        F: Fn(&WaitlistClient, HttpResponse) -> Result<R, ApiError>,
    {
        let mut attempt: u32 = 1;
        loop {
            debug!(attempt, method = request.method.as_str(), "sending waitlist request");

            let outcome = match self.transport.execute(request.clone()).await {
                Ok(response) => parse(&self.client, response),
                Err(err) => Err(ApiError::from_transport(err)),
            };
            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let Some(delay) = self.policy.next_delay(attempt, &err) else {
                debug!(attempt, status = ?err.status, "waitlist request failed, giving up");
                return Err(err);
            };
            debug!(
                attempt,
                status = ?err.status,
                delay_ms = millis(delay),
                "waitlist request failed, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::error::{ErrorCause, TransportError};

    const OK_SIGNUP: &str = r#"{"success":true,"data":{"id":"e_1","email":"ada@example.com","position":1,"is_verified":false,"created_at":"2024-05-01T12:00:00Z"},"message":"ok"}"#;

    /// Replays canned outcomes and records when each attempt happened.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        seen: Mutex<Vec<(Instant, HttpRequest)>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn gaps(&self) -> Vec<Duration> {
            let seen = self.seen.lock().unwrap();
            seen.windows(2).map(|w| w[1].0 - w[0].0).collect()
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push((Instant::now(), request));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Io("script exhausted".to_string())))
        }
    }

    fn status(code: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: code,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn waitlist(max_retries: u32, script: Vec<Result<HttpResponse, TransportError>>) -> Waitlist<Scripted> {
        let config = ClientConfig::new("wl_key")
            .with_base_url("http://waitlist.test")
            .with_max_retries(max_retries);
        Waitlist::with_transport(config, Scripted::new(script)).unwrap()
    }

    fn request() -> SignupRequest {
        SignupRequest::new("ada@example.com")
    }

    #[test]
    fn logged_delay_saturates() {
        assert_eq!(millis(Duration::from_secs(4)), 4_000);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt() {
        let wl = waitlist(3, vec![status(201, OK_SIGNUP)]);
        let response = wl.signup(&request()).await.unwrap();
        assert_eq!(response, serde_json::from_str::<SignupResponse>(OK_SIGNUP).unwrap());
        assert_eq!(wl.transport().attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        for code in [400, 401, 403, 404, 409, 422, 429, 499] {
            let wl = waitlist(3, vec![status(code, r#"{"error":"nope"}"#)]);
            let err = wl.signup(&request()).await.unwrap_err();
            assert_eq!(err.status, Some(code));
            assert_eq!(err.error, "nope");
            assert_eq!(wl.transport().attempts(), 1, "status {code}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_back_off_exponentially_then_succeed() {
        let wl = waitlist(
            3,
            vec![
                status(503, r#"{"error":"unavailable"}"#),
                status(500, ""),
                status(201, OK_SIGNUP),
            ],
        );
        let response = wl.signup(&request()).await.unwrap();
        assert!(response.success);
        assert_eq!(wl.transport().attempts(), 3);
        assert_eq!(
            wl.transport().gaps(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_last_error() {
        let wl = waitlist(
            3,
            vec![
                status(502, r#"{"error":"first"}"#),
                status(503, r#"{"error":"second"}"#),
                status(504, r#"{"error":"third"}"#),
                status(201, OK_SIGNUP),
            ],
        );
        let err = wl.signup(&request()).await.unwrap_err();
        assert_eq!(err.status, Some(504));
        assert_eq!(err.error, "third");
        assert_eq!(wl.transport().attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_are_retried_with_absent_status() {
        let wl = waitlist(
            2,
            vec![
                Err(TransportError::Connect("refused".to_string())),
                Err(TransportError::Timeout),
            ],
        );
        let err = wl.project_info().await.unwrap_err();
        assert_eq!(err.status, None);
        assert_eq!(err.error, "Request failed");
        assert_eq!(err.cause, Some(ErrorCause::Transport(TransportError::Timeout)));
        assert_eq!(wl.transport().attempts(), 2);
        assert_eq!(wl.transport().gaps(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_budget_rejects_after_timeout() {
        let wl = waitlist(1, vec![Err(TransportError::Timeout), status(201, OK_SIGNUP)]);
        let err = wl.signup(&request()).await.unwrap_err();
        assert_eq!(err.status, None);
        assert_eq!(wl.transport().attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_after_server_error_stops_immediately() {
        let wl = waitlist(
            5,
            vec![status(500, ""), status(422, r#"{"error":"bad_email"}"#)],
        );
        let err = wl.signup(&request()).await.unwrap_err();
        assert_eq!(err.status, Some(422));
        assert_eq!(wl.transport().attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_success_body_is_retried() {
        let wl = waitlist(2, vec![status(200, "<html>"), status(201, OK_SIGNUP)]);
        assert!(wl.signup(&request()).await.is_ok());
        assert_eq!(wl.transport().attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn every_attempt_sends_the_same_request() {
        let wl = waitlist(3, vec![status(500, ""), status(201, OK_SIGNUP)]);
        let metadata = ClientMetadata {
            user_agent: Some("agent/1.0".to_string()),
            referrer: None,
        };
        wl.signup_with_metadata(&request(), &metadata).await.unwrap();
        let requests = wl.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
        assert!(requests[0].body.as_deref().unwrap().contains("agent/1.0"));
    }

    #[tokio::test(start_paused = true)]
    async fn project_info_is_not_cached() {
        let body = r#"{"success":true,"data":{"project_id":"p_1","timestamp":"t"}}"#;
        let wl = waitlist(3, vec![status(200, body), status(200, body)]);
        wl.project_info().await.unwrap();
        wl.project_info().await.unwrap();
        assert_eq!(wl.transport().attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn token_operations_use_their_endpoints() {
        let wl = waitlist(
            3,
            vec![
                status(200, r#"{"success":true,"message":"Email verified"}"#),
                status(200, r#"{"success":true,"message":"Unsubscribed"}"#),
            ],
        );
        assert_eq!(wl.verify_email("t1").await.unwrap().message, "Email verified");
        assert_eq!(wl.unsubscribe("t2").await.unwrap().message, "Unsubscribed");
        let urls: Vec<String> = wl.transport().requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://waitlist.test/api/v1/verify?api_key=wl_key".to_string(),
                "http://waitlist.test/api/v1/unsubscribe?api_key=wl_key".to_string(),
            ]
        );
    }
}
