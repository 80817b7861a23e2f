//! Capability classes and the route authorizer.
//!
//! Each destination in the app requires one [`Capability`]. The rules live
//! in a single declarative table, [`CAPABILITY_RULES`], and [`authorize`]
//! evaluates it against a session snapshot. Evaluation is pure and total:
//! every combination of flags yields either allow or a redirect.

use crate::roles::Role;
use crate::routes::{ADMIN_PANEL_PATH, HOME_PATH, LOGIN_PATH};
use crate::session::Session;

/// Named access-control rule a destination requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Public,
    AnyAuthenticated,
    AdminAny,
    RecordsAccess,
    MechanicOnly,
    BillingOnly,
    EcommerceOnly,
    SuperuserOnly,
}

impl Capability {
    /// All capability classes in evaluation priority order.
    pub const ALL: [Capability; 8] = [
        Capability::Public,
        Capability::AnyAuthenticated,
        Capability::AdminAny,
        Capability::RecordsAccess,
        Capability::MechanicOnly,
        Capability::BillingOnly,
        Capability::EcommerceOnly,
        Capability::SuperuserOnly,
    ];
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

impl RouteDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, RouteDecision::Allow)
    }
}

/// What a capability demands of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// No requirement.
    Always,
    /// An access token or the guest flag.
    TokenOrGuest,
    /// An access token plus at least one of the listed roles.
    TokenAndAnyOf(&'static [Role]),
}

impl Requirement {
    pub fn is_met(self, session: &Session) -> bool {
        match self {
            Requirement::Always => true,
            Requirement::TokenOrGuest => session.has_token() || session.is_guest,
            Requirement::TokenAndAnyOf(roles) => {
                session.has_token() && session.roles.has_any(roles)
            }
        }
    }
}

/// One row of the capability table.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityRule {
    pub capability: Capability,
    pub requirement: Requirement,
    /// Where to send a session that fails the requirement.
    pub on_deny: &'static str,
}

const ANY_STAFF: &[Role] = &[
    Role::Staff,
    Role::Superuser,
    Role::Mechanic,
    Role::Billing,
    Role::Ecommerce,
];
const RECORDS: &[Role] = &[Role::Mechanic, Role::Billing, Role::Superuser, Role::Staff];
const MECHANIC: &[Role] = &[Role::Mechanic, Role::Superuser];
const BILLING: &[Role] = &[Role::Billing, Role::Superuser, Role::Staff];
const ECOMMERCE: &[Role] = &[Role::Ecommerce, Role::Superuser, Role::Staff];
const SUPERUSER: &[Role] = &[Role::Superuser];

/// The capability table, in evaluation priority order.
pub const CAPABILITY_RULES: [CapabilityRule; 8] = [
    CapabilityRule {
        capability: Capability::Public,
        requirement: Requirement::Always,
        on_deny: HOME_PATH,
    },
    CapabilityRule {
        capability: Capability::AnyAuthenticated,
        requirement: Requirement::TokenOrGuest,
        on_deny: LOGIN_PATH,
    },
    CapabilityRule {
        capability: Capability::AdminAny,
        requirement: Requirement::TokenAndAnyOf(ANY_STAFF),
        on_deny: HOME_PATH,
    },
    CapabilityRule {
        capability: Capability::RecordsAccess,
        requirement: Requirement::TokenAndAnyOf(RECORDS),
        on_deny: ADMIN_PANEL_PATH,
    },
    CapabilityRule {
        capability: Capability::MechanicOnly,
        requirement: Requirement::TokenAndAnyOf(MECHANIC),
        on_deny: ADMIN_PANEL_PATH,
    },
    CapabilityRule {
        capability: Capability::BillingOnly,
        requirement: Requirement::TokenAndAnyOf(BILLING),
        on_deny: ADMIN_PANEL_PATH,
    },
    CapabilityRule {
        capability: Capability::EcommerceOnly,
        requirement: Requirement::TokenAndAnyOf(ECOMMERCE),
        on_deny: ADMIN_PANEL_PATH,
    },
    CapabilityRule {
        capability: Capability::SuperuserOnly,
        requirement: Requirement::TokenAndAnyOf(SUPERUSER),
        on_deny: ADMIN_PANEL_PATH,
    },
];

/// Look up the table row for a capability.
pub fn rule_for(capability: Capability) -> &'static CapabilityRule {
    // The table covers every variant; the fallback is the most restrictive row.
    CAPABILITY_RULES
        .iter()
        .find(|rule| rule.capability == capability)
        .unwrap_or(&CAPABILITY_RULES[CAPABILITY_RULES.len() - 1])
}

/// Decide whether `session` may enter a destination requiring `capability`.
pub fn authorize(session: &Session, capability: Capability) -> RouteDecision {
    let rule = rule_for(capability);
    if rule.requirement.is_met(session) {
        RouteDecision::Allow
    } else {
        RouteDecision::Redirect(rule.on_deny)
    }
}
