//! Local field validation run before a signup is submitted.
//!
//! These checks only catch obviously malformed input. The service has the
//! final word and reports its own objections through `ApiError::details`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::SignupRequest;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;
pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 100;

/// A form field the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Email,
    Name,
    Phone,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Email, Field::Name, Field::Phone];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Name => "name",
            Field::Phone => "phone",
        }
    }

    /// Case-sensitive match on the wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorCode {
    Required,
    InvalidEmail,
    InvalidPhone,
    TooShort,
    TooLong,
    InsufficientDigits,
    TooManyDigits,
}

/// Per-field failures; `None` means the field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub email: Option<ValidationErrorCode>,
    pub name: Option<ValidationErrorCode>,
    pub phone: Option<ValidationErrorCode>,
}

impl FormErrors {
    pub fn has_errors(&self) -> bool {
        self.email.is_some() || self.name.is_some() || self.phone.is_some()
    }

    pub fn get(&self, field: Field) -> Option<ValidationErrorCode> {
        match field {
            Field::Email => self.email,
            Field::Name => self.name,
            Field::Phone => self.phone,
        }
    }

    fn set(&mut self, field: Field, code: ValidationErrorCode) {
        match field {
            Field::Email => self.email = Some(code),
            Field::Name => self.name = Some(code),
            Field::Phone => self.phone = Some(code),
        }
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationErrorCode> {
    if email.is_empty() {
        return Err(ValidationErrorCode::Required);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationErrorCode::InvalidEmail);
    }
    Ok(())
}

/// Phone is optional; when present it needs 10 to 15 digits, formatting aside.
pub fn validate_phone(phone: &str) -> Result<(), ValidationErrorCode> {
    if phone.is_empty() {
        return Ok(());
    }
    let digits = count_digits(phone);
    if digits < MIN_PHONE_DIGITS {
        return Err(ValidationErrorCode::InsufficientDigits);
    }
    if digits > MAX_PHONE_DIGITS {
        return Err(ValidationErrorCode::TooManyDigits);
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ValidationErrorCode> {
    if name.is_empty() {
        return Ok(());
    }
    let len = name.trim().chars().count();
    if len < MIN_NAME_CHARS {
        return Err(ValidationErrorCode::TooShort);
    }
    if len > MAX_NAME_CHARS {
        return Err(ValidationErrorCode::TooLong);
    }
    Ok(())
}

/// Validate a whole form.
///
/// Email is checked only when required. Name and phone are checked when
/// filled in or required. A form with neither email nor phone is always
/// rejected, on email unless phone is the only required contact field.
pub fn validate_form(data: &SignupRequest, required: &[Field]) -> FormErrors {
    let mut errors = FormErrors::default();
    let is_required = |field| required.contains(&field);
    let name = data.name.as_deref().unwrap_or_default();
    let phone = data.phone.as_deref().unwrap_or_default();

    if is_required(Field::Email) {
        if let Err(code) = validate_email(&data.email) {
            errors.set(Field::Email, code);
        }
    }
    if !name.is_empty() || is_required(Field::Name) {
        if let Err(code) = validate_name(name) {
            errors.set(Field::Name, code);
        }
    }
    if !phone.is_empty() || is_required(Field::Phone) {
        if let Err(code) = validate_phone(phone) {
            errors.set(Field::Phone, code);
        }
    }

    if data.email.is_empty() && phone.is_empty() {
        let field = if !is_required(Field::Email) && is_required(Field::Phone) {
            Field::Phone
        } else {
            Field::Email
        };
        errors.set(field, ValidationErrorCode::Required);
    }

    errors
}

/// Default copy shown for a validation failure on `field`.
pub fn default_error_message(code: ValidationErrorCode, field: &str) -> String {
    match code {
        ValidationErrorCode::Required => format!("{field} is required"),
        ValidationErrorCode::InvalidEmail => "Please enter a valid email address".to_string(),
        ValidationErrorCode::InvalidPhone => "Please enter a valid phone number".to_string(),
        ValidationErrorCode::TooShort => format!("{field} is too short"),
        ValidationErrorCode::TooLong => format!("{field} is too long"),
        ValidationErrorCode::InsufficientDigits => {
            format!("Phone number must have at least {MIN_PHONE_DIGITS} digits")
        }
        ValidationErrorCode::TooManyDigits => {
            format!("Phone number must have at most {MAX_PHONE_DIGITS} digits")
        }
    }
}

pub(crate) fn count_digits(s: &str) -> usize {
    s.chars().filter(char::is_ascii_digit).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert_eq!(validate_email(""), Err(ValidationErrorCode::Required));
        assert_eq!(validate_email("ada"), Err(ValidationErrorCode::InvalidEmail));
        assert_eq!(validate_email("ada@example"), Err(ValidationErrorCode::InvalidEmail));
        assert_eq!(validate_email("a da@example.com"), Err(ValidationErrorCode::InvalidEmail));
        assert_eq!(validate_email("ada@example.com"), Ok(()));
        assert_eq!(validate_email("ada+tag@mail.example.co.uk"), Ok(()));
    }

    #[test]
    fn phone_counts_digits_only() {
        assert_eq!(validate_phone(""), Ok(()));
        assert_eq!(validate_phone("+1 (555) 123-4567"), Ok(()));
        assert_eq!(
            validate_phone("555-1234"),
            Err(ValidationErrorCode::InsufficientDigits)
        );
        assert_eq!(
            validate_phone("+1 2345 6789 0123 4567"),
            Err(ValidationErrorCode::TooManyDigits)
        );
    }

    #[test]
    fn name_length_ignores_surrounding_space() {
        assert_eq!(validate_name(""), Ok(()));
        assert_eq!(validate_name("  A  "), Err(ValidationErrorCode::TooShort));
        assert_eq!(validate_name("Al"), Ok(()));
        assert_eq!(validate_name("Zoë"), Ok(()));
        assert_eq!(validate_name(&"x".repeat(101)), Err(ValidationErrorCode::TooLong));
    }

    #[test]
    fn form_with_valid_email_passes() {
        let data = SignupRequest::new("ada@example.com").with_name("Ada");
        assert!(!validate_form(&data, &[Field::Email]).has_errors());
    }

    #[test]
    fn optional_fields_checked_only_when_filled() {
        let data = SignupRequest::new("ada@example.com").with_phone("123");
        let errors = validate_form(&data, &[Field::Email]);
        assert_eq!(errors.phone, Some(ValidationErrorCode::InsufficientDigits));
        assert_eq!(errors.name, None);
    }

    #[test]
    fn required_but_empty_name_still_passes() {
        let data = SignupRequest::new("ada@example.com");
        let errors = validate_form(&data, &[Field::Email, Field::Name]);
        // An empty name passes `validate_name`; only the contact rule can fail here.
        assert!(!errors.has_errors());
    }

    #[test]
    fn email_not_required_is_not_shape_checked() {
        let data = SignupRequest::new("not-an-email");
        assert!(!validate_form(&data, &[]).has_errors());
    }

    #[test]
    fn missing_contact_flags_email_by_default() {
        let errors = validate_form(&SignupRequest::default(), &[]);
        assert_eq!(errors.email, Some(ValidationErrorCode::Required));
        assert_eq!(errors.phone, None);
    }

    #[test]
    fn missing_contact_flags_phone_when_only_phone_required() {
        let errors = validate_form(&SignupRequest::default(), &[Field::Phone]);
        assert_eq!(errors.phone, Some(ValidationErrorCode::Required));
        assert_eq!(errors.email, None);
    }

    #[test]
    fn phone_alone_satisfies_contact_rule() {
        let data = SignupRequest::default().with_phone("+44 7700 900123");
        assert!(!validate_form(&data, &[Field::Phone]).has_errors());
    }

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            default_error_message(ValidationErrorCode::Required, "Email"),
            "Email is required"
        );
        assert_eq!(
            default_error_message(ValidationErrorCode::InsufficientDigits, "Phone"),
            "Phone number must have at least 10 digits"
        );
    }

    #[test]
    fn field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.as_str()), Some(field));
        }
        assert_eq!(Field::from_name("tags"), None);
    }
}
