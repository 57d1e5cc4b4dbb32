//! Headless signup form.
//!
//! # Design
//! `SignupForm` holds what a rendered form would: field values, per-field
//! error messages and a submission status. It renders nothing. The signup
//! call goes through an injected `SignupService`, so hosts and tests swap the
//! backend by construction instead of patching a shared client.

use async_trait::async_trait;
use tracing::debug;

use crate::api::Waitlist;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{SignupEntry, SignupRequest, SignupResponse};
use crate::validation::{default_error_message, validate_form, Field, FormErrors};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Successfully joined the waitinglist!";
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Anything that can enroll a signup.
#[async_trait]
pub trait SignupService: Send + Sync {
    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError>;
}

#[async_trait]
impl<T: Transport> SignupService for Waitlist<T> {
    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        Waitlist::signup(self, request).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOptions {
    pub field: Field,
    pub required: bool,
}

impl FieldOptions {
    pub fn optional(field: Field) -> Self {
        Self {
            field,
            required: false,
        }
    }

    pub fn required(field: Field) -> Self {
        Self {
            field,
            required: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    /// Fields shown on the form. Email is added if missing.
    pub fields: Vec<FieldOptions>,
    /// Sent with every signup from this form.
    pub tags: Vec<String>,
    pub disabled: bool,
    pub reset_on_success: bool,
    pub show_messages: bool,
    pub success_message: String,
    pub error_message: String,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            fields: vec![
                FieldOptions::optional(Field::Email),
                FieldOptions::optional(Field::Name),
            ],
            tags: Vec::new(),
            disabled: false,
            reset_on_success: true,
            show_messages: true,
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Success,
    Error,
}

/// What happened to a `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The form is disabled; nothing was validated or sent.
    Skipped,
    /// Local validation failed; nothing was sent.
    Invalid(FormErrors),
    Joined(SignupEntry),
    Failed(ApiError),
}

/// Error text currently attached to each field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMessages {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl FieldMessages {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Email => &self.email,
            Field::Name => &self.name,
            Field::Phone => &self.phone,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Email => &mut self.email,
            Field::Name => &mut self.name,
            Field::Phone => &mut self.phone,
        }
    }

    fn from_validation(errors: &FormErrors) -> Self {
        let mut messages = Self::default();
        for field in Field::ALL {
            if let Some(code) = errors.get(field) {
                *messages.slot_mut(field) = Some(default_error_message(code, field_label(field)));
            }
        }
        messages
    }
}

fn field_label(field: Field) -> &'static str {
    match field {
        Field::Email => "Email",
        Field::Name => "Name",
        Field::Phone => "Phone",
    }
}

#[derive(Debug, Clone, Default)]
struct Values {
    email: String,
    name: String,
    phone: String,
}

impl Values {
    fn slot_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Email => &mut self.email,
            Field::Name => &mut self.name,
            Field::Phone => &mut self.phone,
        }
    }
}

pub struct SignupForm<S> {
    service: S,
    options: FormOptions,
    values: Values,
    errors: FieldMessages,
    status: SubmitStatus,
    status_message: Option<String>,
}

impl<S: SignupService> SignupForm<S> {
    pub fn new(service: S, mut options: FormOptions) -> Self {
        if !options.fields.iter().any(|f| f.field == Field::Email) {
            options.fields.insert(0, FieldOptions::optional(Field::Email));
        }
        Self {
            service,
            options,
            values: Values::default(),
            errors: FieldMessages::default(),
            status: SubmitStatus::Idle,
            status_message: None,
        }
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn shows(&self, field: Field) -> bool {
        self.options.fields.iter().any(|f| f.field == field)
    }

    pub fn errors(&self) -> &FieldMessages {
        &self.errors
    }

    pub fn status(&self) -> SubmitStatus {
        self.status
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.values.email,
            Field::Name => &self.values.name,
            Field::Phone => &self.values.phone,
        }
    }

    /// Store a new value, clearing that field's error and any status message.
    pub fn update_field(&mut self, field: Field, value: impl Into<String>) {
        *self.values.slot_mut(field) = value.into();
        *self.errors.slot_mut(field) = None;
        self.status = SubmitStatus::Idle;
        self.status_message = None;
    }

    /// The request this form would submit right now.
    pub fn request(&self) -> SignupRequest {
        let non_empty = |s: &String| (!s.is_empty()).then(|| s.clone());
        SignupRequest {
            email: self.values.email.clone(),
            name: non_empty(&self.values.name),
            phone: non_empty(&self.values.phone),
            tags: self.options.tags.clone(),
        }
    }

    fn required_fields(&self) -> Vec<Field> {
        self.options
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.field)
            .collect()
    }

    /// Validate and, if clean, submit through the injected service.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.options.disabled {
            return SubmitOutcome::Skipped;
        }

        let request = self.request();
        let validation = validate_form(&request, &self.required_fields());
        if validation.has_errors() {
            self.errors = FieldMessages::from_validation(&validation);
            return SubmitOutcome::Invalid(validation);
        }

        self.errors = FieldMessages::default();
        self.status = SubmitStatus::Idle;
        self.status_message = None;

        match self.service.signup(&request).await {
            Ok(response) => {
                self.status = SubmitStatus::Success;
                if self.options.show_messages {
                    self.status_message = Some(self.options.success_message.clone());
                }
                if self.options.reset_on_success {
                    self.values = Values::default();
                }
                SubmitOutcome::Joined(response.data)
            }
            Err(err) => {
                debug!(error = %err, "waitlist signup failed");
                self.status = SubmitStatus::Error;
                if self.options.show_messages {
                    self.status_message = Some(self.failure_message(&err));
                }
                if let Some(details) = &err.details {
                    let mut messages = FieldMessages::default();
                    for detail in details {
                        if let Some(field) = Field::from_name(&detail.field) {
                            *messages.slot_mut(field) = Some(detail.message.clone());
                        }
                    }
                    self.errors = messages;
                }
                SubmitOutcome::Failed(err)
            }
        }
    }

    fn failure_message(&self, err: &ApiError) -> String {
        [Some(err.error.as_str()), err.message.as_deref()]
            .into_iter()
            .flatten()
            .find(|m| !m.is_empty())
            .unwrap_or(self.options.error_message.as_str())
            .to_string()
    }
}
