//! The signed-in user as held by the session.

use paratha_core::{Email, Role, UserId};
use serde::{Deserialize, Serialize};

use crate::api::ApiUser;

/// The authenticated user.
///
/// `role` is the trusted role established at login or from the persisted
/// role hint. Profile data from the server never changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub addresses: Vec<String>,
    pub role: Role,
    pub business_name: Option<String>,
    pub gst_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_number: Option<String>,
}

impl User {
    /// Build a user from an API payload. `role` overrides the payload's role.
    #[must_use]
    pub fn from_api(user: ApiUser, role: Option<Role>) -> Self {
        let role = role.or(user.role).unwrap_or_default();
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            addresses: user.address.into_iter().filter(|a| !a.trim().is_empty()).collect(),
            role,
            business_name: user.business_name,
            gst_number: user.gst_number,
            vehicle_type: user.vehicle_type,
            license_number: user.license_number,
        }
    }

    /// Merge fresh profile data, keeping the trusted role.
    pub(crate) fn merge_profile(&mut self, profile: ApiUser) {
        let role = self.role;
        let addresses = std::mem::take(&mut self.addresses);
        let mut merged = Self::from_api(profile, Some(role));
        if merged.addresses.is_empty() {
            merged.addresses = addresses;
        }
        merged.phone = merged.phone.or_else(|| self.phone.take());
        merged.business_name = merged.business_name.or_else(|| self.business_name.take());
        merged.gst_number = merged.gst_number.or_else(|| self.gst_number.take());
        merged.vehicle_type = merged.vehicle_type.or_else(|| self.vehicle_type.take());
        merged.license_number = merged.license_number.or_else(|| self.license_number.take());
        *self = merged;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn api_user(role: Option<Role>) -> ApiUser {
        ApiUser {
            id: UserId::new("u1"),
            name: "Asha".into(),
            email: Email::parse("asha@example.com").unwrap(),
            phone: Some("9999999999".into()),
            address: Some("12 MG Road".into()),
            role,
            business_name: None,
            gst_number: None,
            vehicle_type: None,
            license_number: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_role_override_and_default() {
        assert_eq!(User::from_api(api_user(Some(Role::Admin)), Some(Role::Business)).role, Role::Business);
        assert_eq!(User::from_api(api_user(Some(Role::Delivery)), None).role, Role::Delivery);
        assert_eq!(User::from_api(api_user(None), None).role, Role::Customer);
    }

    #[test]
    fn test_merge_keeps_role_and_missing_fields() {
        let mut user = User::from_api(api_user(Some(Role::Business)), None);
        let mut fresh = api_user(Some(Role::Customer));
        fresh.name = "Asha K".into();
        fresh.phone = None;
        fresh.address = None;

        user.merge_profile(fresh);
        assert_eq!(user.role, Role::Business);
        assert_eq!(user.name, "Asha K");
        assert_eq!(user.phone.as_deref(), Some("9999999999"));
        assert_eq!(user.addresses, vec!["12 MG Road".to_owned()]);
    }
}
