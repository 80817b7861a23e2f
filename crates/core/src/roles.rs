//! Staff role flags carried by an authenticated session.
//!
//! The backend reports each role as an independent boolean on the user
//! record. A session may hold any combination; superuser access to other
//! role-gated areas is granted by listing [`Role::Superuser`] in each rule,
//! never by an implicit bypass.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A single staff capability marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Superuser,
    Mechanic,
    Billing,
    Ecommerce,
}

impl Role {
    /// Every role, in badge priority order.
    pub const ALL: [Role; 5] = [
        Role::Superuser,
        Role::Staff,
        Role::Mechanic,
        Role::Billing,
        Role::Ecommerce,
    ];

    /// Name of the flag as it appears on the backend user record.
    pub fn flag_name(self) -> &'static str {
        match self {
            Role::Staff => "is_staff",
            Role::Superuser => "is_superuser",
            Role::Mechanic => "is_mechanic",
            Role::Billing => "is_billing",
            Role::Ecommerce => "is_ecommerce",
        }
    }

    /// Short label shown next to the signed-in user.
    pub fn badge(self) -> &'static str {
        match self {
            Role::Superuser => "ROOT ADMIN",
            Role::Staff => "STAFF OPS",
            Role::Mechanic => "ENGINEERING",
            Role::Billing => "FINANCE",
            Role::Ecommerce => "LOGISTICS",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Staff => "staff",
            Role::Superuser => "superuser",
            Role::Mechanic => "mechanic",
            Role::Billing => "billing",
            Role::Ecommerce => "ecommerce",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staff" => Ok(Role::Staff),
            "superuser" => Ok(Role::Superuser),
            "mechanic" => Ok(Role::Mechanic),
            "billing" => Ok(Role::Billing),
            "ecommerce" => Ok(Role::Ecommerce),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// The five independent role booleans of a session.
///
/// Serialized with the backend's field names so the login payload's `user`
/// object deserializes straight into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_mechanic: bool,
    #[serde(default)]
    pub is_billing: bool,
    #[serde(default)]
    pub is_ecommerce: bool,
}

impl RoleFlags {
    /// Build a flag set with exactly the given roles enabled.
    pub fn with(roles: &[Role]) -> Self {
        let mut flags = Self::default();
        for role in roles {
            flags.set(*role, true);
        }
        flags
    }

    pub fn has(&self, role: Role) -> bool {
        match role {
            Role::Staff => self.is_staff,
            Role::Superuser => self.is_superuser,
            Role::Mechanic => self.is_mechanic,
            Role::Billing => self.is_billing,
            Role::Ecommerce => self.is_ecommerce,
        }
    }

    pub fn set(&mut self, role: Role, value: bool) {
        match role {
            Role::Staff => self.is_staff = value,
            Role::Superuser => self.is_superuser = value,
            Role::Mechanic => self.is_mechanic = value,
            Role::Billing => self.is_billing = value,
            Role::Ecommerce => self.is_ecommerce = value,
        }
    }

    /// True when at least one of `roles` is held.
    pub fn has_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has(*role))
    }

    /// True when any staff-side role is held at all.
    pub fn is_any_staff(&self) -> bool {
        self.has_any(&Role::ALL)
    }

    /// Roles currently held, in badge priority order.
    pub fn held(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|r| self.has(*r)).collect()
    }

    /// Badge for the highest-priority role held, if any.
    pub fn badge(&self) -> Option<&'static str> {
        Role::ALL
            .into_iter()
            .find(|r| self.has(*r))
            .map(Role::badge)
    }

    /// Clearance label shown in the admin panel header.
    pub fn clearance_label(&self) -> &'static str {
        if self.is_superuser {
            "ROOT_ACCESS"
        } else if self.is_staff {
            "ADMIN_STAFF"
        } else {
            "OPERATOR"
        }
    }
}
