//! Integration tests for the Paratha client.
//!
//! Every test runs the real `reqwest` client and file-backed token store
//! against a `wiremock` server standing in for the Paratha API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p paratha-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_client` - Wire format, headers and error messages
//! - `session_flow` - Login, restart, logout and rejected tokens
//! - `app_flow` - Cart rules driven by the session role, address book
//! - `admin_flow` - User listing and role changes for admins

use std::path::PathBuf;
use std::time::Duration;

use paratha_client::{App, ClientConfig};
use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token issued by [`TestContext::mock_login`].
pub const TEST_TOKEN: &str = "tok-test-1";

/// Mock API plus a scratch data directory.
pub struct TestContext {
    pub server: MockServer,
    pub data_dir: TempDir,
}

impl TestContext {
    /// Start a mock server and create an empty data directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            data_dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Client configuration pointing at the mock server.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid URL.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: Url::parse(&self.server.uri()).expect("mock server URL"),
            request_timeout: Duration::from_secs(5),
            data_dir: self.data_dir.path().to_path_buf(),
            ..ClientConfig::default()
        }
    }

    /// Path of the persisted session file.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.config().session_file()
    }

    /// Build a fresh app sharing this context's server and data directory,
    /// as if the process had restarted.
    ///
    /// # Panics
    ///
    /// Panics if the app cannot be built.
    pub async fn app(&self) -> App {
        App::from_config(self.config()).await.expect("build app")
    }

    /// Answer `POST /api/auth/login` with [`TEST_TOKEN`] and a user of `role`.
    pub async fn mock_login(&self, role: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": TEST_TOKEN,
                "user": user_json(role),
                "msg": "Login successful"
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer `GET /api/user/profile` for [`TEST_TOKEN`] with a user of `role`.
    pub async fn mock_profile(&self, role: &str) {
        Mock::given(method("GET"))
            .and(path("/api/user/profile"))
            .and(header("x-auth-token", TEST_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user_json(role) })))
            .mount(&self.server)
            .await;
    }

    /// Answer `POST /api/auth/logout` with `status`.
    pub async fn mock_logout(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "msg": "Logged out" })))
            .mount(&self.server)
            .await;
    }
}

/// A user payload in the server's format.
#[must_use]
pub fn user_json(role: &str) -> Value {
    json!({
        "_id": "665f1c2e9b1e8a0012a4b001",
        "name": "Asha Menon",
        "email": "asha@example.com",
        "phone": "9876543210",
        "address": "12 MG Road, Kochi",
        "role": role,
        "createdAt": "2025-01-05T10:00:00.000Z"
    })
}

/// An address payload in the server's format.
#[must_use]
pub fn address_json(id: &str, label: &str, is_default: bool) -> Value {
    json!({
        "_id": id,
        "label": label,
        "street": "12 MG Road",
        "city": "Kochi",
        "state": "KL",
        "zipCode": "682001",
        "latitude": 9.93,
        "longitude": 76.26,
        "isDefault": is_default
    })
}

/// A user as listed by the admin endpoints.
#[must_use]
pub fn admin_user_json(id: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "name": format!("User {id}"),
        "email": format!("{id}@example.com"),
        "gender": "female",
        "role": role,
        "date": "2025-03-10T09:15:00.000Z",
        "__v": 0
    })
}
