//! Client core for the waitinglist.dev API.
//!
//! # Overview
//! Two layers share the same request shaping and error normalization:
//! - `WaitlistClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO pattern). Hosts that
//!   own their HTTP stack, such as the C ABI in `waitlist-ffi`, use it
//!   directly together with `RetryPolicy`.
//! - `Waitlist` runs the same requests through a `Transport` with
//!   exponential backoff.
//!
//! # Design
//! - Every failure becomes one `ApiError` shape, whether it came from the
//!   service, the network or a malformed body.
//! - Client errors (4xx) are final. Everything else is retried while the
//!   attempt budget lasts.
//! - Validation, phone helpers and the headless `SignupForm` hold no UI;
//!   they only produce values a front end can render.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod phone;
pub mod retry;
pub mod transport;
pub mod types;
pub mod validation;

pub use api::Waitlist;
pub use client::WaitlistClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorCause, TransportError};
pub use form::{FormOptions, SignupForm, SignupService, SubmitOutcome};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use retry::RetryPolicy;
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    ClientMetadata, FieldDetail, ProjectInfo, ProjectInfoResponse, SignupEntry, SignupRequest,
    SignupResponse, StatusMessage, UnsubscribeResponse, VerificationResponse,
};
