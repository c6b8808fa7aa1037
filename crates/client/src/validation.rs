//! Local form validation run before any network call.

use paratha_core::{Email, EmailError};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::api::{BusinessSignup, CustomerSignup, DeliverySignup, LoginRequest};

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum name length.
pub const MIN_NAME_LEN: usize = 2;

/// A form field that failed validation. `Display` is the message shown under
/// the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password is required")]
    PasswordRequired,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Name is required")]
    NameRequired,

    #[error("Name must be at least {MIN_NAME_LEN} characters")]
    NameTooShort,

    #[error("{0} is required")]
    Required(&'static str),
}

/// Validate an email address.
///
/// # Errors
///
/// `EmailRequired` when blank, `InvalidEmail` when malformed.
pub fn validate_email(email: &str) -> Result<Email, ValidationError> {
    Email::parse(email).map_err(|e| match e {
        EmailError::Empty => ValidationError::EmailRequired,
        _ => ValidationError::InvalidEmail,
    })
}

/// Validate a password.
///
/// # Errors
///
/// `PasswordRequired` when blank, `PasswordTooShort` below the minimum length.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Check that a password and its confirmation are identical.
///
/// # Errors
///
/// `PasswordMismatch` when they differ.
pub fn validate_password_match(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password == confirm {
        Ok(())
    } else {
        Err(ValidationError::PasswordMismatch)
    }
}

/// Validate a person's name.
///
/// # Errors
///
/// `NameRequired` when blank, `NameTooShort` below the minimum length.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort);
    }
    Ok(())
}

/// Require a non-blank value.
///
/// # Errors
///
/// `Required(field)` when blank.
pub fn validate_required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

impl LoginRequest {
    /// Build a login request from raw form input.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn from_form(email: &str, password: SecretString) -> Result<Self, ValidationError> {
        let email = validate_email(email)?;
        if password.expose_secret().trim().is_empty() {
            return Err(ValidationError::PasswordRequired);
        }
        Ok(Self {
            email: email.into_inner(),
            password,
        })
    }
}

fn validate_common(
    name: &str,
    email: &str,
    password: &SecretString,
    phone: &str,
) -> Result<(), ValidationError> {
    validate_name(name)?;
    validate_email(email)?;
    validate_password(password.expose_secret())?;
    validate_required(phone, "Phone number")
}

impl CustomerSignup {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_common(&self.name, &self.email, &self.password, &self.phone)
    }
}

impl BusinessSignup {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_common(&self.name, &self.email, &self.password, &self.phone)?;
        validate_required(&self.business_name, "Business name")?;
        validate_required(&self.gst_number, "GST number")
    }
}

impl DeliverySignup {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_common(&self.name, &self.email, &self.password, &self.phone)?;
        validate_required(&self.vehicle_type, "Vehicle type")?;
        validate_required(&self.license_number, "License number")
    }
}
