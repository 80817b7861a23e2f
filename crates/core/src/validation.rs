//! Input validation for the account forms.
//!
//! These checks run locally before any request is sent, so an obviously
//! malformed form never reaches the backend.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

/// Username/password pair submitted at login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginCredentials {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Trimmed copy, validated.
    pub fn checked(&self) -> Result<Self, CoreError> {
        let creds = Self {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        };
        creds.validate()?;
        Ok(creds)
    }
}

/// The registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "email address is not valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "password is too short"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub confirm_password: String,
}

/// Body sent to the backend for a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
}

impl Registration {
    /// Normalise and validate the form into the request body.
    ///
    /// Usernames are trimmed; emails are trimmed and lowercased. Self-service
    /// accounts are never staff.
    pub fn into_payload(self) -> Result<RegistrationPayload, CoreError> {
        let normalized = Registration {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            ..self
        };
        normalized.validate()?;
        Ok(RegistrationPayload {
            username: normalized.username,
            email: normalized.email,
            password: normalized.password,
            is_staff: false,
        })
    }
}

/// Request for a password recovery link.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email(message = "email address is not valid"))]
    pub email: String,
}

/// The reset-confirmation form reached from the emailed link.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetConfirm {
    #[validate(length(min = 1))]
    pub uid: String,
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, message = "password is too short"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "passwords do not match"))]
    pub confirm_password: String,
}

/// Body sent to the backend to complete a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordResetConfirmPayload {
    pub uid: String,
    pub token: String,
    pub new_password: String,
}

impl PasswordResetConfirm {
    pub fn into_payload(self) -> Result<PasswordResetConfirmPayload, CoreError> {
        self.validate()?;
        Ok(PasswordResetConfirmPayload {
            uid: self.uid,
            token: self.token,
            new_password: self.new_password,
        })
    }
}
