//! Session error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::validation::ValidationError;

/// Errors returned by [`SessionManager`](super::SessionManager) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another session operation is still in flight.
    #[error("Another request is already in progress")]
    Busy,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Already signed in")]
    AlreadyAuthenticated,
}

impl SessionError {
    /// Message for the session's `error` field.
    ///
    /// Responses the client could not make sense of are reported with the
    /// operation's generic `fallback` message.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api(e) if e.is_malformed_response() => fallback.to_owned(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let malformed = SessionError::Api(ApiError::Incomplete("token"));
        assert_eq!(malformed.user_message("Login failed"), "Login failed");

        let rejected = SessionError::Api(ApiError::Rejected {
            status: 401,
            message: "Invalid credentials".into(),
        });
        assert_eq!(rejected.user_message("Login failed"), "Invalid credentials");

        let invalid = SessionError::Validation(ValidationError::PasswordTooShort);
        assert_eq!(
            invalid.user_message("Registration failed"),
            "Password must be at least 6 characters"
        );
    }
}
