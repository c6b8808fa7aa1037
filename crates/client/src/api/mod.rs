//! HTTP client for the Paratha REST API.
//!
//! The session, address book and admin directory talk to the API through the
//! [`AuthApi`], [`AddressApi`] and [`AdminApi`] traits so they can be driven
//! by fakes in tests. [`ApiClient`] is the `reqwest` implementation of all of
//! them.
//!
//! # Example
//!
//! ```rust,ignore
//! use paratha_client::api::{ApiClient, LoginRequest};
//!
//! let client = ApiClient::new(&config)?;
//! let session = client
//!     .login(&LoginRequest { email: "asha@example.com".into(), password })
//!     .await?;
//! let profile = client.get_profile(&session.token).await?;
//! ```

mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use paratha_core::{AddressId, Role, UserId};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::ClientConfig;

/// Errors that can occur when calling the API.
///
/// `Display` yields a message suitable for showing to the user.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the request and explained why.
    #[error("{message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the response body.
        message: String,
    },

    /// The server rejected the request without an explanation.
    #[error("{}", status_message(*.status))]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Network error. Please check your connection.")]
    Network(#[source] reqwest::Error),

    /// An endpoint URL could not be built from the base URL.
    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    /// A 2xx response whose body could not be decoded.
    #[error("Unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),

    /// A 2xx response that lacks a required field.
    #[error("Unexpected response from server: missing {0}")]
    Incomplete(&'static str),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Status { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server refused the credentials or token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }

    /// Whether the error came from a malformed success response rather than
    /// a refusal or a transport failure.
    #[must_use]
    pub const fn is_malformed_response(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Incomplete(_))
    }
}

/// Human-readable message for a status code without a body message.
fn status_message(status: u16) -> String {
    match status {
        400 => "Invalid request data".to_string(),
        401 => "Authentication failed".to_string(),
        403 => "Access denied".to_string(),
        404 => "Resource not found".to_string(),
        409 => "Resource already exists".to_string(),
        500 => "Server error occurred".to_string(),
        other => format!("Request failed with status {other}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator Traits
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication and profile endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /api/auth/login`.
    async fn login(&self, request: &LoginRequest) -> Result<AuthSession, ApiError>;

    /// `POST /api/auth/signup`.
    async fn register_customer(&self, form: &CustomerSignup) -> Result<AuthSession, ApiError>;

    /// `POST /api/auth/business/signup`.
    async fn register_business(&self, form: &BusinessSignup) -> Result<AuthSession, ApiError>;

    /// `POST /api/auth/delivery/signup`.
    async fn register_delivery(&self, form: &DeliverySignup) -> Result<AuthSession, ApiError>;

    /// `GET /api/user/profile`.
    async fn get_profile(&self, token: &SecretString) -> Result<ApiUser, ApiError>;

    /// `PUT /api/user/profile`.
    async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> Result<ApiUser, ApiError>;

    /// `POST /api/user/change-password`. Returns the server's confirmation.
    async fn change_password(
        &self,
        token: &SecretString,
        request: &ChangePasswordRequest,
    ) -> Result<Option<String>, ApiError>;

    /// `POST /api/auth/logout`.
    async fn logout(&self, token: &SecretString) -> Result<(), ApiError>;
}

/// Saved-address endpoints.
#[async_trait]
pub trait AddressApi: Send + Sync {
    /// `GET /api/addresses`.
    async fn list_addresses(&self, token: &SecretString) -> Result<Vec<ApiAddress>, ApiError>;

    /// `POST /api/addresses`.
    async fn create_address(
        &self,
        token: &SecretString,
        request: &CreateAddressRequest,
    ) -> Result<ApiAddress, ApiError>;

    /// `PUT /api/addresses/{id}`.
    async fn update_address(
        &self,
        token: &SecretString,
        id: &AddressId,
        request: &UpdateAddressRequest,
    ) -> Result<ApiAddress, ApiError>;

    /// `DELETE /api/addresses/{id}`.
    async fn delete_address(&self, token: &SecretString, id: &AddressId) -> Result<(), ApiError>;

    /// `PUT /api/addresses/{id}/default`.
    async fn set_default_address(
        &self,
        token: &SecretString,
        id: &AddressId,
    ) -> Result<(), ApiError>;
}

/// User-management endpoints. The server only honours these for admins.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// `GET /api/admin/users`.
    async fn list_users(&self, token: &SecretString) -> Result<UserPage, ApiError>;

    /// `GET /api/admin/users/{id}`.
    async fn get_user(&self, token: &SecretString, id: &UserId) -> Result<AdminUser, ApiError>;

    /// `PUT /api/admin/users/{id}/role`.
    async fn update_user_role(
        &self,
        token: &SecretString,
        id: &UserId,
        role: Role,
    ) -> Result<AdminUser, ApiError>;

    /// `DELETE /api/admin/users/{id}`.
    async fn delete_user(&self, token: &SecretString, id: &UserId) -> Result<(), ApiError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Client
// ─────────────────────────────────────────────────────────────────────────────

/// `reqwest` client for the Paratha API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_base_url(config.api_base_url.clone(), config.request_timeout)
    }

    /// Create a client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn with_base_url(mut base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        // Endpoints are joined relative to the base, so it must end in `/`
        // for a path prefix such as `/v1` to survive.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ParathaClient/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// Get the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        Ok(self.inner.client.request(method, url))
    }

    /// Build a request carrying the session token.
    ///
    /// The server accepts either header depending on the route, so both are sent.
    fn authorized(
        &self,
        method: Method,
        path: &str,
        token: &SecretString,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .request(method, path)?
            .bearer_auth(token.expose_secret())
            .header("x-auth-token", token.expose_secret()))
    }

    /// Send a request and return the body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!(error = %e, timeout = e.is_timeout(), "API request failed");
            ApiError::Network(e)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::Network)?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let error_body: MessageBody = serde_json::from_slice(&body).unwrap_or_default();
        let status = status.as_u16();
        tracing::debug!(status, "API request rejected");

        Err(match error_body.into_message() {
            Some(message) if !message.trim().is_empty() => ApiError::Rejected { status, message },
            _ => ApiError::Status { status },
        })
    }

    /// Send a request and decode a JSON body.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send a request whose body is at most an acknowledgement message.
    async fn acknowledge(&self, request: RequestBuilder) -> Result<Option<String>, ApiError> {
        let body = self.execute(request).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let message: MessageBody = serde_json::from_slice(&body).unwrap_or_default();
        Ok(message.into_message())
    }

    async fn authenticate<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<AuthSession, ApiError> {
        let request = self.request(Method::POST, path)?.json(body);
        let response: AuthResponseBody = self.fetch(request).await?;

        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Incomplete("token"))?;
        let user = response
            .user
            .ok_or(ApiError::Incomplete("user"))?
            .into_user();

        Ok(AuthSession {
            token: SecretString::from(token),
            user,
        })
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    #[instrument(skip_all, fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> Result<AuthSession, ApiError> {
        self.authenticate("/api/auth/login", request).await
    }

    #[instrument(skip_all, fields(email = %form.email))]
    async fn register_customer(&self, form: &CustomerSignup) -> Result<AuthSession, ApiError> {
        let body = WithRole {
            form,
            role: Role::Customer,
        };
        self.authenticate("/api/auth/signup", &body).await
    }

    #[instrument(skip_all, fields(email = %form.email))]
    async fn register_business(&self, form: &BusinessSignup) -> Result<AuthSession, ApiError> {
        let body = WithRole {
            form,
            role: Role::Business,
        };
        self.authenticate("/api/auth/business/signup", &body).await
    }

    #[instrument(skip_all, fields(email = %form.email))]
    async fn register_delivery(&self, form: &DeliverySignup) -> Result<AuthSession, ApiError> {
        let body = WithRole {
            form,
            role: Role::Delivery,
        };
        self.authenticate("/api/auth/delivery/signup", &body).await
    }

    #[instrument(skip_all)]
    async fn get_profile(&self, token: &SecretString) -> Result<ApiUser, ApiError> {
        let request = self.authorized(Method::GET, "/api/user/profile", token)?;
        let envelope: UserEnvelope = self.fetch(request).await?;
        Ok(envelope.into_user())
    }

    #[instrument(skip_all)]
    async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> Result<ApiUser, ApiError> {
        let request = self
            .authorized(Method::PUT, "/api/user/profile", token)?
            .json(update);
        let envelope: UserEnvelope = self.fetch(request).await?;
        Ok(envelope.into_user())
    }

    #[instrument(skip_all)]
    async fn change_password(
        &self,
        token: &SecretString,
        request: &ChangePasswordRequest,
    ) -> Result<Option<String>, ApiError> {
        let request = self
            .authorized(Method::POST, "/api/user/change-password", token)?
            .json(request);
        self.acknowledge(request).await
    }

    #[instrument(skip_all)]
    async fn logout(&self, token: &SecretString) -> Result<(), ApiError> {
        let request = self.authorized(Method::POST, "/api/auth/logout", token)?;
        self.acknowledge(request).await.map(|_| ())
    }
}

#[async_trait]
impl AddressApi for ApiClient {
    #[instrument(skip_all)]
    async fn list_addresses(&self, token: &SecretString) -> Result<Vec<ApiAddress>, ApiError> {
        let request = self.authorized(Method::GET, "/api/addresses", token)?;
        let body: AddressListBody = self.fetch(request).await?;
        Ok(body.into_addresses())
    }

    #[instrument(skip_all)]
    async fn create_address(
        &self,
        token: &SecretString,
        request: &CreateAddressRequest,
    ) -> Result<ApiAddress, ApiError> {
        let request = self
            .authorized(Method::POST, "/api/addresses", token)?
            .json(request);
        let body: AddressBody = self.fetch(request).await?;
        Ok(body.address)
    }

    #[instrument(skip_all, fields(address_id = %id))]
    async fn update_address(
        &self,
        token: &SecretString,
        id: &AddressId,
        request: &UpdateAddressRequest,
    ) -> Result<ApiAddress, ApiError> {
        let request = self
            .authorized(Method::PUT, &format!("/api/addresses/{id}"), token)?
            .json(request);
        let body: AddressBody = self.fetch(request).await?;
        Ok(body.address)
    }

    #[instrument(skip_all, fields(address_id = %id))]
    async fn delete_address(&self, token: &SecretString, id: &AddressId) -> Result<(), ApiError> {
        let request = self.authorized(Method::DELETE, &format!("/api/addresses/{id}"), token)?;
        self.acknowledge(request).await.map(|_| ())
    }

    #[instrument(skip_all, fields(address_id = %id))]
    async fn set_default_address(
        &self,
        token: &SecretString,
        id: &AddressId,
    ) -> Result<(), ApiError> {
        let request =
            self.authorized(Method::PUT, &format!("/api/addresses/{id}/default"), token)?;
        self.acknowledge(request).await.map(|_| ())
    }
}

#[async_trait]
impl AdminApi for ApiClient {
    #[instrument(skip_all)]
    async fn list_users(&self, token: &SecretString) -> Result<UserPage, ApiError> {
        let request = self.authorized(Method::GET, "/api/admin/users", token)?;
        let body: UserListBody = self.fetch(request).await?;
        Ok(body.into_page())
    }

    #[instrument(skip_all, fields(user_id = %id))]
    async fn get_user(&self, token: &SecretString, id: &UserId) -> Result<AdminUser, ApiError> {
        let request = self.authorized(Method::GET, &format!("/api/admin/users/{id}"), token)?;
        let envelope: AdminUserEnvelope = self.fetch(request).await?;
        Ok(envelope.into_user())
    }

    #[instrument(skip_all, fields(user_id = %id, role = %role))]
    async fn update_user_role(
        &self,
        token: &SecretString,
        id: &UserId,
        role: Role,
    ) -> Result<AdminUser, ApiError> {
        let request = self
            .authorized(Method::PUT, &format!("/api/admin/users/{id}/role"), token)?
            .json(&UpdateRoleRequest { role });
        let envelope: AdminUserEnvelope = self.fetch(request).await?;
        Ok(envelope.into_user())
    }

    #[instrument(skip_all, fields(user_id = %id))]
    async fn delete_user(&self, token: &SecretString, id: &UserId) -> Result<(), ApiError> {
        let request = self.authorized(Method::DELETE, &format!("/api/admin/users/{id}"), token)?;
        self.acknowledge(request).await.map(|_| ())
    }
}
