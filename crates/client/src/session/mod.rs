//! Authenticated-session lifecycle.
//!
//! [`SessionManager`] owns the auth token and the signed-in user. It restores
//! a persisted session at start-up, performs login and registration, keeps the
//! profile fresh and signs out. State is published on a `watch` channel so UI
//! layers can react to changes.
//!
//! # State machine
//!
//! ```text
//! rehydrating ──▶ signed_out ──▶ authenticating ──▶ authenticated
//!      │              ▲                 │                 │
//!      │              └─────────────────┘                 │
//!      └──────────────────────────────▶ ◀─── logout ──────┘
//! ```
//!
//! Only one operation runs at a time. A second call while one is pending
//! fails with [`SessionError::Busy`] without touching the network or state.

mod error;
mod user;

pub use error::SessionError;
pub use user::User;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use paratha_core::{Role, Route, SessionStatus};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::instrument;

use crate::api::{
    ApiError, ApiUser, AuthApi, AuthSession, BusinessSignup, ChangePasswordRequest, CustomerSignup,
    DeliverySignup, LoginRequest, ProfileUpdate,
};
use crate::storage::{AUTH_TOKEN_KEY, TokenStore, USER_ROLE_KEY};
use crate::validation::{self, ValidationError};

/// Snapshot of the observable session state.
///
/// The auth token is never part of the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub status: SessionStatus,
    /// Present iff `status` is `Authenticated`.
    pub user: Option<User>,
    /// Last failure message, for display.
    pub error: Option<String>,
    /// Whether an operation is in flight.
    pub loading: bool,
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }

    /// Role of the signed-in user.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }

    /// Where the app should navigate for this state.
    #[must_use]
    pub fn landing_route(&self) -> Route {
        match (&self.status, &self.user) {
            (SessionStatus::Authenticated, Some(user)) => user.role.home_route(),
            _ => Route::Onboarding,
        }
    }
}

/// Owns the authenticated session.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    token: Mutex<Option<Arc<SecretString>>>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Holds the single in-flight slot. Dropping it (including when the owning
/// future is cancelled) releases the slot and settles transitional statuses.
struct InFlight<'a> {
    session: &'a SessionManager,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.state.send_if_modified(|state| {
            let mut changed = std::mem::take(&mut state.loading);
            if matches!(
                state.status,
                SessionStatus::Authenticating | SessionStatus::Rehydrating
            ) {
                state.status = SessionStatus::SignedOut;
                state.user = None;
                changed = true;
            }
            changed
        });
        self.session.in_flight.store(false, Ordering::Release);
    }
}

impl SessionManager {
    /// Create a session in the `Rehydrating` state.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            store,
            state: watch::Sender::new(SessionState::default()),
            token: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Route for the current state.
    #[must_use]
    pub fn landing_route(&self) -> Route {
        self.state.borrow().landing_route()
    }

    /// Dismiss the last error message.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    /// Token for authenticated requests, if signed in.
    pub(crate) fn access_token(&self) -> Option<Arc<SecretString>> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────────────────────

    /// Restore a persisted session.
    ///
    /// Reads the stored token and validates it by fetching the profile. The
    /// persisted role hint takes precedence over the profile's role. Any
    /// failure discards the stored credential and ends signed out; nothing is
    /// reported on `error`.
    ///
    /// Returns the restored user, or `None` when signed out.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if another operation is in flight.
    #[instrument(skip_all)]
    pub async fn rehydrate(&self) -> Result<Option<User>, SessionError> {
        let _guard = self.begin()?;
        let existing = self.state.borrow().user.clone();
        if existing.is_some() {
            return Ok(existing);
        }
        self.state.send_modify(|state| state.status = SessionStatus::Rehydrating);

        let token = match self.store.get(AUTH_TOKEN_KEY).await {
            Ok(Some(token)) if !token.trim().is_empty() => SecretString::from(token),
            Ok(_) => {
                tracing::debug!("No persisted session");
                self.settle_signed_out(None);
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted token");
                self.discard_credentials().await;
                self.settle_signed_out(None);
                return Ok(None);
            }
        };

        let role_hint = match self.store.get(USER_ROLE_KEY).await {
            Ok(hint) => hint.and_then(|raw| raw.parse::<Role>().ok()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted role");
                None
            }
        };

        match self.api.get_profile(&token).await {
            Ok(profile) => {
                let user = User::from_api(profile, role_hint);
                tracing::info!(user_id = %user.id, role = %user.role, "Session restored");
                self.set_token(Some(token));
                self.settle_authenticated(user.clone());
                Ok(Some(user))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted session rejected");
                self.discard_credentials().await;
                self.settle_signed_out(None);
                Ok(None)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Login & Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// - `Busy` / `AlreadyAuthenticated` without changing state
    /// - `Validation` for bad input, `Api` when the server refuses; both are
    ///   also reported on `error` and leave the session signed out
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: SecretString) -> Result<User, SessionError> {
        let _guard = self.begin_signed_out()?;
        let request = LoginRequest::from_form(email, password)
            .map_err(|e| self.fail_signed_out(e.into(), "Login failed"))?;
        self.establish("Login failed", None, self.api.login(&request))
            .await
    }

    /// Register a retail customer and sign in.
    ///
    /// # Errors
    ///
    /// See [`login`](Self::login).
    #[instrument(skip_all)]
    pub async fn register_customer(&self, form: &CustomerSignup) -> Result<User, SessionError> {
        let _guard = self.begin_signed_out()?;
        self.validate_signup(form.validate())?;
        self.establish(
            "Registration failed",
            Some(Role::Customer),
            self.api.register_customer(form),
        )
        .await
    }

    /// Register a business buyer and sign in.
    ///
    /// # Errors
    ///
    /// See [`login`](Self::login).
    #[instrument(skip_all)]
    pub async fn register_business(&self, form: &BusinessSignup) -> Result<User, SessionError> {
        let _guard = self.begin_signed_out()?;
        self.validate_signup(form.validate())?;
        self.establish(
            "Business registration failed",
            Some(Role::Business),
            self.api.register_business(form),
        )
        .await
    }

    /// Register a delivery partner and sign in.
    ///
    /// # Errors
    ///
    /// See [`login`](Self::login).
    #[instrument(skip_all)]
    pub async fn register_delivery(&self, form: &DeliverySignup) -> Result<User, SessionError> {
        let _guard = self.begin_signed_out()?;
        self.validate_signup(form.validate())?;
        self.establish(
            "Delivery partner registration failed",
            Some(Role::Delivery),
            self.api.register_delivery(form),
        )
        .await
    }

    /// Sign out.
    ///
    /// The server is told best-effort; local credentials and the user are
    /// cleared regardless. Returns the route to navigate to.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if another operation is in flight.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<Route, SessionError> {
        let _guard = self.begin()?;

        // The session stays intact until the server call settles, so a
        // cancelled logout leaves the user signed in.
        if let Some(token) = self.access_token()
            && let Err(e) = self.api.logout(&token).await
        {
            tracing::warn!(error = %e, "Logout request failed; clearing local session anyway");
        }

        self.discard_credentials().await;
        self.settle_signed_out(None);
        tracing::info!("Signed out");
        Ok(Route::Login)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────────

    /// Refresh the user from the server.
    ///
    /// # Errors
    ///
    /// - `Busy` / `NotAuthenticated` without changing state
    /// - `Api` when the request fails, also reported on `error`
    #[instrument(skip_all)]
    pub async fn get_profile(&self) -> Result<User, SessionError> {
        let _guard = self.begin()?;
        let token = self.require_token()?;
        self.clear_error();
        match self.api.get_profile(&token).await {
            Ok(profile) => self.merge_profile(profile),
            Err(e) => Err(self.fail_in_place(e.into(), "Failed to fetch profile")),
        }
    }

    /// Update profile fields.
    ///
    /// # Errors
    ///
    /// See [`get_profile`](Self::get_profile); also `Validation` for a bad
    /// name.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, SessionError> {
        let _guard = self.begin()?;
        let token = self.require_token()?;
        self.clear_error();
        if let Some(name) = &update.name {
            validation::validate_name(name)
                .map_err(|e| self.fail_in_place(e.into(), "Failed to update profile"))?;
        }
        match self.api.update_profile(&token, update).await {
            Ok(profile) => self.merge_profile(profile),
            Err(e) => Err(self.fail_in_place(e.into(), "Failed to update profile")),
        }
    }

    /// Change the account password. Returns the server's confirmation
    /// message, if any.
    ///
    /// # Errors
    ///
    /// See [`get_profile`](Self::get_profile); also `Validation` for a
    /// missing current password or a too-short new one.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current_password: SecretString,
        new_password: SecretString,
    ) -> Result<Option<String>, SessionError> {
        let _guard = self.begin()?;
        let token = self.require_token()?;
        self.clear_error();

        let checked = validation::validate_required(
            current_password.expose_secret(),
            "Current password",
        )
        .and_then(|()| validation::validate_password(new_password.expose_secret()));
        if let Err(e) = checked {
            return Err(self.fail_in_place(e.into(), "Failed to change password"));
        }

        let request = ChangePasswordRequest {
            current_password,
            new_password,
        };
        self.api
            .change_password(&token, &request)
            .await
            .map_err(|e| self.fail_in_place(e.into(), "Failed to change password"))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn begin(&self) -> Result<InFlight<'_>, SessionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SessionError::Busy);
        }
        self.state.send_if_modified(|state| !std::mem::replace(&mut state.loading, true));
        Ok(InFlight { session: self })
    }

    fn begin_signed_out(&self) -> Result<InFlight<'_>, SessionError> {
        if self.state.borrow().is_authenticated() {
            return Err(SessionError::AlreadyAuthenticated);
        }
        self.begin()
    }

    fn require_token(&self) -> Result<Arc<SecretString>, SessionError> {
        if !self.state.borrow().is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        self.access_token().ok_or(SessionError::NotAuthenticated)
    }

    fn validate_signup(&self, result: Result<(), ValidationError>) -> Result<(), SessionError> {
        result.map_err(|e| self.fail_signed_out(e.into(), "Registration failed"))
    }

    /// Run a login-like request and settle the session on its outcome.
    async fn establish(
        &self,
        fallback: &str,
        role: Option<Role>,
        request: impl Future<Output = Result<AuthSession, ApiError>>,
    ) -> Result<User, SessionError> {
        self.state.send_modify(|state| {
            state.status = SessionStatus::Authenticating;
            state.error = None;
        });

        match request.await {
            Ok(session) => Ok(self.sign_in(session, role).await),
            Err(e) => {
                tracing::warn!(error = %e, "Authentication failed");
                Err(self.fail_signed_out(e.into(), fallback))
            }
        }
    }

    async fn sign_in(&self, session: AuthSession, registered_as: Option<Role>) -> User {
        let role = session.user.role.or(registered_as);
        let user = User::from_api(session.user, role);

        if let Err(e) = self
            .store
            .set(AUTH_TOKEN_KEY, session.token.expose_secret())
            .await
        {
            tracing::warn!(error = %e, "Failed to persist auth token");
        }
        if let Err(e) = self.store.set(USER_ROLE_KEY, user.role.as_str()).await {
            tracing::warn!(error = %e, "Failed to persist role");
        }

        self.set_token(Some(session.token));
        self.settle_authenticated(user.clone());
        tracing::info!(user_id = %user.id, role = %user.role, "Signed in");
        user
    }

    fn merge_profile(&self, profile: ApiUser) -> Result<User, SessionError> {
        let mut merged = None;
        self.state.send_if_modified(|state| {
            let Some(user) = state.user.as_mut() else {
                return false;
            };
            user.merge_profile(profile);
            merged = Some(user.clone());
            true
        });
        merged.ok_or(SessionError::NotAuthenticated)
    }

    fn set_token(&self, token: Option<SecretString>) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = token.map(Arc::new);
    }

    /// Remove the persisted credential, then the in-memory token.
    async fn discard_credentials(&self) {
        for key in [AUTH_TOKEN_KEY, USER_ROLE_KEY] {
            if let Err(e) = self.store.remove(key).await {
                tracing::warn!(key, error = %e, "Failed to remove persisted credential");
            }
        }
        self.set_token(None);
    }

    fn settle_authenticated(&self, user: User) {
        self.state.send_modify(|state| {
            state.status = SessionStatus::Authenticated;
            state.user = Some(user);
            state.error = None;
        });
    }

    fn settle_signed_out(&self, error: Option<String>) {
        self.state.send_modify(|state| {
            state.status = SessionStatus::SignedOut;
            state.user = None;
            state.error = error;
        });
    }

    fn fail_signed_out(&self, error: SessionError, fallback: &str) -> SessionError {
        self.settle_signed_out(Some(error.user_message(fallback)));
        error
    }

    fn fail_in_place(&self, error: SessionError, fallback: &str) -> SessionError {
        let message = error.user_message(fallback);
        tracing::warn!(error = %error, "Account request failed");
        self.state.send_modify(|state| state.error = Some(message));
        error
    }
}
