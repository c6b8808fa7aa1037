//! Request and response payloads of the Paratha REST API.
//!
//! Wire names are camelCase. Several endpoints are loose about envelopes
//! (a user may arrive bare or wrapped in `{ "user": ... }`), so the response
//! types accept every shape the server is known to produce.

use chrono::{DateTime, Utc};
use paratha_core::{AddressId, Email, Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// A user as returned by the auth and profile endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// `None` when the server omits the role or sends one we do not know.
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn lenient_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Role>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|role| role.parse().ok()))
}

/// A user either bare or wrapped one level deep.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserEnvelope {
    Nested { user: ApiUser },
    Flat(ApiUser),
}

impl UserEnvelope {
    pub(crate) fn into_user(self) -> ApiUser {
        match self {
            Self::Nested { user } | Self::Flat(user) => user,
        }
    }
}

/// Raw body of the login and signup endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponseBody {
    pub token: Option<String>,
    pub user: Option<UserEnvelope>,
}

/// A successful login or registration.
#[derive(Debug)]
pub struct AuthSession {
    /// Credential for subsequent requests.
    pub token: SecretString,
    /// The signed-in user.
    pub user: ApiUser,
}

/// Body of endpoints that only acknowledge with a message.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessageBody {
    pub msg: Option<String>,
    pub message: Option<String>,
}

impl MessageBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message.or(self.msg)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Serialize a secret by exposing it. Only used for request bodies.
fn expose_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Credentials for `POST /api/auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
}

/// Registration form of a retail customer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSignup {
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
    pub phone: String,
    /// First delivery address; may be empty.
    pub address: String,
}

/// Registration form of a business (bulk) buyer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSignup {
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
    pub phone: String,
    pub address: String,
    pub business_name: String,
    pub gst_number: String,
}

/// Registration form of a delivery partner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySignup {
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
    pub phone: String,
    pub address: String,
    pub vehicle_type: String,
    pub license_number: String,
}

/// Signup payload with the role the endpoint expects.
#[derive(Serialize)]
pub(crate) struct WithRole<'a, T: Serialize> {
    #[serde(flatten)]
    pub form: &'a T,
    pub role: Role,
}

/// Partial profile update; `None` fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gst_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Body of `POST /api/user/change-password`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(serialize_with = "expose_secret")]
    pub current_password: SecretString,
    #[serde(serialize_with = "expose_secret")]
    pub new_password: SecretString,
}

// ─────────────────────────────────────────────────────────────────────────────
// Addresses
// ─────────────────────────────────────────────────────────────────────────────

/// Label of a saved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    #[default]
    Home,
    Work,
    Other,
}

impl std::fmt::Display for AddressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Work => write!(f, "work"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for AddressKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "work" => Ok(Self::Work),
            "other" => Ok(Self::Other),
            _ => Err(format!("invalid address label: {s}")),
        }
    }
}

/// An address as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAddress {
    #[serde(alias = "_id")]
    pub id: AddressId,
    pub label: AddressKind,
    #[serde(default)]
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Address list, either wrapped or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AddressListBody {
    Wrapped { addresses: Vec<ApiAddress> },
    Bare(Vec<ApiAddress>),
}

impl AddressListBody {
    pub(crate) fn into_addresses(self) -> Vec<ApiAddress> {
        match self {
            Self::Wrapped { addresses } | Self::Bare(addresses) => addresses,
        }
    }
}

/// Body of endpoints returning a single address.
#[derive(Debug, Deserialize)]
pub(crate) struct AddressBody {
    pub address: ApiAddress,
}

/// Body of `POST /api/addresses`.
///
/// The server validates `zip` while storing `zipCode`, so both carry the
/// same value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    pub label: AddressKind,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub zip: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_default: bool,
}

/// Body of `PUT /api/addresses/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<AddressKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin
// ─────────────────────────────────────────────────────────────────────────────

/// A user as listed by the admin endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
    /// Registration time.
    #[serde(default, alias = "date")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Paging information of a user listing.
///
/// Servers that return a bare array get a single page holding every user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_users: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// One page of users.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPage {
    pub users: Vec<AdminUser>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PagedUsers {
    #[serde(default)]
    users: Vec<AdminUser>,
    total_users: Option<u64>,
    current_page: Option<u32>,
    total_pages: Option<u32>,
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    has_prev_page: bool,
}

/// User list, either paginated or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserListBody {
    Bare(Vec<AdminUser>),
    Paged(PagedUsers),
}

impl UserListBody {
    pub(crate) fn into_page(self) -> UserPage {
        match self {
            Self::Bare(users) => UserPage {
                pagination: Pagination {
                    total_users: users.len() as u64,
                    current_page: 1,
                    total_pages: 1,
                    has_next_page: false,
                    has_prev_page: false,
                },
                users,
            },
            Self::Paged(page) => UserPage {
                pagination: Pagination {
                    total_users: page.total_users.unwrap_or(page.users.len() as u64),
                    current_page: page.current_page.unwrap_or(1),
                    total_pages: page.total_pages.unwrap_or(1),
                    has_next_page: page.has_next_page,
                    has_prev_page: page.has_prev_page,
                },
                users: page.users,
            },
        }
    }
}

/// An admin user either bare or wrapped in `{ "user": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AdminUserEnvelope {
    Nested { user: AdminUser },
    Flat(AdminUser),
}

impl AdminUserEnvelope {
    pub(crate) fn into_user(self) -> AdminUser {
        match self {
            Self::Nested { user } | Self::Flat(user) => user,
        }
    }
}

/// Body of `PUT /api/admin/users/{id}/role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_json(role: &str) -> serde_json::Value {
        json!({
            "_id": "u1",
            "name": "Asha",
            "email": "asha@example.com",
            "phone": "9999999999",
            "role": role,
            "createdAt": "2025-01-05T10:00:00Z"
        })
    }

    #[test]
    fn test_user_envelope_accepts_both_shapes() {
        let flat: UserEnvelope = serde_json::from_value(user_json("customer")).unwrap();
        let nested: UserEnvelope =
            serde_json::from_value(json!({ "user": user_json("business") })).unwrap();

        assert_eq!(flat.into_user().role, Some(Role::Customer));
        let user = nested.into_user();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.role, Some(Role::Business));
    }

    #[test]
    fn test_unknown_role_is_none() {
        let user: ApiUser = serde_json::from_value(user_json("restaurant")).unwrap();
        assert_eq!(user.role, None);

        let mut value = user_json("customer");
        value.as_object_mut().unwrap().remove("role");
        let user: ApiUser = serde_json::from_value(value).unwrap();
        assert_eq!(user.role, None);
    }

    #[test]
    fn test_signup_payload_carries_role_and_password() {
        let form = BusinessSignup {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password: SecretString::from("hunter22"),
            phone: "9999999999".into(),
            address: "12 MG Road".into(),
            business_name: "Asha Foods".into(),
            gst_number: "29ABCDE1234F1Z5".into(),
        };
        let body = serde_json::to_value(WithRole {
            form: &form,
            role: Role::Business,
        })
        .unwrap();

        assert_eq!(body["role"], "business");
        assert_eq!(body["password"], "hunter22");
        assert_eq!(body["businessName"], "Asha Foods");
        assert!(!format!("{form:?}").contains("hunter22"));
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            phone: Some("12345".into()),
            ..ProfileUpdate::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "phone": "12345" }));
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_address_list_accepts_both_shapes() {
        let address = json!({
            "id": "a1",
            "label": "work",
            "street": "1 Tech Park",
            "city": "Pune",
            "state": "MH",
            "zipCode": "411001",
            "isDefault": true
        });
        let wrapped: AddressListBody =
            serde_json::from_value(json!({ "addresses": [address.clone()] })).unwrap();
        let bare: AddressListBody = serde_json::from_value(json!([address])).unwrap();

        assert_eq!(wrapped.into_addresses().len(), 1);
        let addresses = bare.into_addresses();
        assert_eq!(addresses[0].label, AddressKind::Work);
        assert!(addresses[0].is_default);
    }

    #[test]
    fn test_user_list_accepts_both_shapes() {
        let user = json!({
            "_id": "u9",
            "name": "Meera",
            "email": "meera@example.com",
            "gender": "female",
            "role": "delivery",
            "date": "2025-02-01T08:30:00.000Z",
            "__v": 0
        });

        let bare: UserListBody = serde_json::from_value(json!([user.clone()])).unwrap();
        let page = bare.into_page();
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users.first().unwrap().role, Some(Role::Delivery));
        assert!(page.users.first().unwrap().created_at.is_some());
        assert_eq!(page.pagination.total_users, 1);
        assert_eq!(page.pagination.total_pages, 1);

        let paged: UserListBody = serde_json::from_value(json!({
            "users": [user],
            "totalUsers": 41,
            "currentPage": 2,
            "totalPages": 3,
            "hasNextPage": true,
            "hasPrevPage": true
        }))
        .unwrap();
        let page = paged.into_page();
        assert_eq!(page.users.first().unwrap().id.as_str(), "u9");
        assert_eq!(
            page.pagination,
            Pagination {
                total_users: 41,
                current_page: 2,
                total_pages: 3,
                has_next_page: true,
                has_prev_page: true,
            }
        );
    }

    #[test]
    fn test_paged_list_defaults_missing_counts() {
        let body: UserListBody = serde_json::from_value(json!({ "users": [] })).unwrap();
        let page = body.into_page();
        assert!(page.users.is_empty());
        assert_eq!(page.pagination.current_page, 1);
        assert_eq!(page.pagination.total_users, 0);
    }
}
