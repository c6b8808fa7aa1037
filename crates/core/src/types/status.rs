//! Status enums for client-side state machines.

use serde::{Deserialize, Serialize};

/// Lifecycle status of the authenticated session.
///
/// A session starts in [`SessionStatus::Rehydrating`] until the persisted
/// token has been checked, then settles in `SignedOut` or `Authenticated`.
/// `Authenticating` is only observed while a login or registration request
/// is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Rehydrating,
    SignedOut,
    Authenticating,
    Authenticated,
}

impl SessionStatus {
    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rehydrating => write!(f, "rehydrating"),
            Self::SignedOut => write!(f, "signed_out"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}
