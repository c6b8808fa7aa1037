//! User roles and the routes they gate.

use serde::{Deserialize, Serialize};

/// Authorization class of an authenticated user.
///
/// Serialized in lowercase to match the wire format (`"customer"`,
/// `"business"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Retail buyer ordering for themselves.
    #[default]
    Customer,
    /// Business account buying in bulk.
    Business,
    /// Delivery partner fulfilling orders.
    Delivery,
    /// Operator with access to the user list.
    Admin,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Self; 4] = [Self::Customer, Self::Business, Self::Delivery, Self::Admin];

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Business => "business",
            Self::Delivery => "delivery",
            Self::Admin => "admin",
        }
    }

    /// Whether cart quantities for this role follow the bulk rules.
    #[must_use]
    pub const fn is_bulk_buyer(&self) -> bool {
        matches!(self, Self::Business)
    }

    /// The screen a signed-in user of this role lands on.
    #[must_use]
    pub const fn home_route(&self) -> Route {
        match self {
            Self::Customer => Route::CustomerHome,
            Self::Business => Route::BusinessDashboard,
            Self::Delivery => Route::DeliveryDashboard,
            Self::Admin => Route::AdminUsers,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RoleParseError(s.to_owned()))
    }
}

/// Top-level destinations the session decides between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// First-run screens shown to signed-out users.
    Onboarding,
    /// Entry screen after logout.
    Login,
    /// Customer tabs (menu, search, cart, profile).
    CustomerHome,
    /// Business dashboard.
    BusinessDashboard,
    /// Delivery partner dashboard.
    DeliveryDashboard,
    /// Admin user list.
    AdminUsers,
}

impl Route {
    /// Navigation path of the route.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Onboarding => "/onboarding",
            Self::Login => "/auth/login",
            Self::CustomerHome => "/(tabs)",
            Self::BusinessDashboard => "/business/BusinessDashboard",
            Self::DeliveryDashboard => "/delivery/DeliveryPartnerDashboard",
            Self::AdminUsers => "/admin/users-list",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Delivery).unwrap(), "\"delivery\"");
        let role: Role = serde_json::from_str("\"business\"").unwrap();
        assert_eq!(role, Role::Business);
    }

    #[test]
    fn test_role_from_str_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(
            "chef".parse::<Role>(),
            Err(RoleParseError("chef".to_owned()))
        );
    }

    #[test]
    fn test_only_business_buys_in_bulk() {
        let bulk: Vec<_> = Role::ALL.into_iter().filter(Role::is_bulk_buyer).collect();
        assert_eq!(bulk, vec![Role::Business]);
    }

    #[test]
    fn test_home_routes() {
        assert_eq!(Role::Customer.home_route().path(), "/(tabs)");
        assert_eq!(Role::Admin.home_route(), Route::AdminUsers);
        assert_eq!(
            Role::Delivery.home_route().to_string(),
            "/delivery/DeliveryPartnerDashboard"
        );
    }
}
