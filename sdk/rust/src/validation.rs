//! Registration form validation.
//!
//! Field checks produce one message per field, keyed by the form field name,
//! so a sign-up page can render each message next to its input.
//!
//! # Example
//!
//! ```ignore
//! use storefront_sdk::validation::{validate_registration_form, RegistrationVariant};
//!
//! let errors = validate_registration_form(&form, RegistrationVariant::Email);
//! if !errors.is_valid() {
//!     return json(&errors); // {"email": "A valid e-mail address is required."}
//! }
//! ```

use crate::forms::FormData;
use crate::operations::RegisterCustomerInput;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Message for an invalid e-mail address.
pub const INVALID_EMAIL_MESSAGE: &str = "A valid e-mail address is required.";
/// Message for a missing phone number.
pub const INVALID_PHONE_MESSAGE: &str = "A valid phone number is required.";
/// Message for a short or missing password.
pub const PASSWORD_LENGTH_MESSAGE: &str = "Minimum password length is 4 symbols.";
/// Message for a missing repeated password.
pub const REPEAT_PASSWORD_MESSAGE: &str = "Please repeat your password.";
/// Message for differing passwords.
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match!";

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 4;

// `\w` restricted to ASCII word characters.
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9_]+([-+.'][A-Za-z0-9_]+)*@[A-Za-z0-9_]+([-.][A-Za-z0-9_]+)*\.[A-Za-z0-9_]+([-.][A-Za-z0-9_]+)*$";

static EMAIL_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Which identifier a registration form collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationVariant {
    /// `email` field.
    #[default]
    Email,
    /// `phoneNumber` field.
    Phone,
}

/// A validation error for a specific field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Human-readable error message.
    pub message: String,
    /// Machine-readable error code.
    pub code: ValidationErrorCode,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(
        field: impl Into<String>,
        code: ValidationErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorCode {
    /// Value is required but missing.
    Required,
    /// String is too short.
    MinLength,
    /// Invalid email format.
    InvalidEmail,
    /// Value differs from the field it must repeat.
    Mismatch,
}

/// Field errors, at most one per field, in the order they were found.
///
/// Serializes as a `{field: message}` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty error collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error unless the field already has one.
    pub fn push(&mut self, error: ValidationError) {
        if !self.has_field(&error.field) {
            self.errors.push(error);
        }
    }

    /// Returns true if there are no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if the field has an error.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Returns the message for a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Returns the error for a field.
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field)
    }

    /// Iterates over all errors.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Returns the number of failing fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the `{field: message}` mapping.
    pub fn to_map(&self) -> IndexMap<String, String> {
        self.errors
            .iter()
            .map(|e| (e.field.clone(), e.message.clone()))
            .collect()
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.errors.iter().map(|e| (&e.field, &e.message)))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<_> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Builder for validating form fields.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    /// Creates a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts checks on a possibly missing string field.
    pub fn field<'a>(&'a mut self, name: &str, value: Option<&'a str>) -> FieldValidator<'a> {
        FieldValidator {
            errors: &mut self.errors,
            name: name.to_string(),
            value,
            failed: false,
        }
    }

    /// Finishes validation.
    pub fn finish(self) -> ValidationErrors {
        self.errors
    }
}

/// Checks on one field. After the first failing check the rest are skipped.
pub struct FieldValidator<'a> {
    errors: &'a mut ValidationErrors,
    name: String,
    value: Option<&'a str>,
    failed: bool,
}

impl FieldValidator<'_> {
    fn check(mut self, ok: bool, code: ValidationErrorCode, message: &str) -> Self {
        if !self.failed && !ok {
            self.errors.push(ValidationError::new(&self.name, code, message));
            self.failed = true;
        }
        self
    }

    /// The field must be present.
    pub fn present(self, message: &str) -> Self {
        let ok = self.value.is_some();
        self.check(ok, ValidationErrorCode::Required, message)
    }

    /// The field must be present and not blank.
    pub fn required(self, message: &str) -> Self {
        let ok = self.value.is_some_and(|v| !v.trim().is_empty());
        self.check(ok, ValidationErrorCode::Required, message)
    }

    /// The field must have at least `min` characters.
    pub fn min_chars(self, min: usize, message: &str) -> Self {
        let ok = self.value.is_some_and(|v| v.chars().count() >= min);
        self.check(ok, ValidationErrorCode::MinLength, message)
    }

    /// The field must be an e-mail address.
    pub fn email(self, message: &str) -> Self {
        let ok = self.value.is_some_and(is_valid_email);
        self.check(ok, ValidationErrorCode::InvalidEmail, message)
    }

    /// The field must equal `other`.
    pub fn equals(self, other: Option<&str>, message: &str) -> Self {
        let ok = self.value == other;
        self.check(ok, ValidationErrorCode::Mismatch, message)
    }
}

/// Returns true if `email` is an e-mail address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.as_ref().is_some_and(|re| re.is_match(email))
}

/// Validates a sign-up form.
///
/// Returns an empty collection when the form is valid.
pub fn validate_registration_form(
    form: &FormData,
    variant: RegistrationVariant,
) -> ValidationErrors {
    let password = form.get("password");
    let mut validator = Validator::new();

    match variant {
        RegistrationVariant::Email => {
            validator.field("email", form.get("email")).email(INVALID_EMAIL_MESSAGE);
        }
        RegistrationVariant::Phone => {
            validator
                .field("phoneNumber", form.get("phoneNumber"))
                .required(INVALID_PHONE_MESSAGE);
        }
    }

    validator
        .field("password", password)
        .min_chars(MIN_PASSWORD_LENGTH, PASSWORD_LENGTH_MESSAGE);

    validator
        .field("repeatPassword", form.get("repeatPassword"))
        .present(REPEAT_PASSWORD_MESSAGE)
        .equals(password, PASSWORD_MISMATCH_MESSAGE);

    validator.finish()
}

/// Builds the `registerCustomerAccount` input from a sign-up form.
///
/// With the phone variant the account e-mail becomes `<phone>@<domain>`.
/// Missing names default to empty strings.
pub fn extract_registration_values(
    form: &FormData,
    variant: RegistrationVariant,
    phone_email_domain: &str,
) -> RegisterCustomerInput {
    let text = |name: &str| form.get(name).unwrap_or_default().to_string();

    let (email_address, phone_number) = match variant {
        RegistrationVariant::Email => (text("email"), None),
        RegistrationVariant::Phone => {
            let phone = form.get("phoneNumber").unwrap_or_default().trim().to_string();
            (format!("{phone}@{phone_email_domain}"), Some(phone))
        }
    };

    RegisterCustomerInput {
        email_address,
        first_name: text("firstName"),
        last_name: text("lastName"),
        password: text("password"),
        phone_number,
    }
}
