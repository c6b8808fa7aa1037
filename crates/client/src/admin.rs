//! User management for admins.

use std::sync::Arc;

use paratha_core::{Role, UserId};
use secrecy::SecretString;
use thiserror::Error;
use tracing::instrument;

use crate::api::{AdminApi, AdminUser, ApiError, Pagination};

/// Errors from admin directory operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The signed-in user is not an admin.
    #[error("Admin access required")]
    NotAdmin,
}

/// Local copy of the user listing, kept in sync with the server.
///
/// Every operation clears `error` when it starts and sets it on failure.
pub struct AdminDirectory {
    api: Arc<dyn AdminApi>,
    users: Vec<AdminUser>,
    pagination: Pagination,
    error: Option<String>,
}

impl std::fmt::Debug for AdminDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminDirectory")
            .field("users", &self.users.len())
            .field("pagination", &self.pagination)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl AdminDirectory {
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self {
            api,
            users: Vec::new(),
            pagination: Pagination::default(),
            error: None,
        }
    }

    #[must_use]
    pub fn users(&self) -> &[AdminUser] {
        &self.users
    }

    /// Paging of the last successful load.
    #[must_use]
    pub const fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Last failure message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Forget the listing, e.g. on logout.
    pub fn reset(&mut self) {
        self.users.clear();
        self.pagination = Pagination::default();
        self.error = None;
    }

    /// Replace the local listing with the server's.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Api` if the request fails. The previous listing
    /// is kept.
    #[instrument(skip_all)]
    pub async fn load(&mut self, token: &SecretString) -> Result<&[AdminUser], AdminError> {
        self.error = None;
        match self.api.list_users(token).await {
            Ok(page) => {
                self.users = page.users;
                self.pagination = page.pagination;
                tracing::debug!(
                    count = self.users.len(),
                    total = self.pagination.total_users,
                    "Loaded users"
                );
                Ok(&self.users)
            }
            Err(e) => Err(self.fail(e.into(), "Failed to load users")),
        }
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Api` if the request fails.
    #[instrument(skip_all, fields(user_id = %id, role = %role))]
    pub async fn update_role(
        &mut self,
        token: &SecretString,
        id: &UserId,
        role: Role,
    ) -> Result<AdminUser, AdminError> {
        self.error = None;
        match self.api.update_user_role(token, id, role).await {
            Ok(updated) => {
                if let Some(slot) = self.users.iter_mut().find(|u| &u.id == id) {
                    *slot = updated.clone();
                }
                tracing::info!("User role updated");
                Ok(updated)
            }
            Err(e) => Err(self.fail(e.into(), "Failed to update user role")),
        }
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Api` if the request fails.
    #[instrument(skip_all, fields(user_id = %id))]
    pub async fn delete(&mut self, token: &SecretString, id: &UserId) -> Result<(), AdminError> {
        self.error = None;
        match self.api.delete_user(token, id).await {
            Ok(()) => {
                let before = self.users.len();
                self.users.retain(|u| &u.id != id);
                if self.users.len() < before {
                    self.pagination.total_users = self.pagination.total_users.saturating_sub(1);
                }
                tracing::info!("User deleted");
                Ok(())
            }
            Err(e) => Err(self.fail(e.into(), "Failed to delete user")),
        }
    }

    fn fail(&mut self, error: AdminError, fallback: &str) -> AdminError {
        let message = match &error {
            AdminError::Api(e) if e.is_malformed_response() => fallback.to_owned(),
            other => other.to_string(),
        };
        tracing::warn!(error = %error, "Admin request failed");
        self.error = Some(message);
        error
    }
}
