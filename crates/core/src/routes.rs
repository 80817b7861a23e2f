//! Navigation targets, the route table and landing-page rules.

use crate::access::{authorize, Capability, RouteDecision};
use crate::roles::{Role, RoleFlags};
use crate::session::Session;

// ---------------------------------------------------------------------------
// Well-known paths
// ---------------------------------------------------------------------------

pub const LOGIN_PATH: &str = "/login";
/// Login entry point used after a refresh failure.
pub const SESSION_EXPIRED_PATH: &str = "/login?error=expired";
pub const HOME_PATH: &str = "/home";
pub const ADMIN_PANEL_PATH: &str = "/admin-panel";
pub const SELECT_VEHICLE_PATH: &str = "/select-vehicle";

// ---------------------------------------------------------------------------
// Route table
// ---------------------------------------------------------------------------

/// Destination patterns and the capability each requires. First match wins.
pub const ROUTES: &[(&str, Capability)] = &[
    ("/", Capability::Public),
    ("/home", Capability::Public),
    ("/services", Capability::Public),
    ("/login", Capability::Public),
    ("/register", Capability::Public),
    ("/reset-password/:uid/:token", Capability::Public),
    ("/denting-painting", Capability::Public),
    ("/select-vehicle", Capability::AnyAuthenticated),
    ("/dashboard", Capability::AnyAuthenticated),
    ("/history", Capability::AnyAuthenticated),
    ("/parts", Capability::AnyAuthenticated),
    ("/book-service", Capability::AnyAuthenticated),
    ("/checkout/:bookingId", Capability::AnyAuthenticated),
    ("/admin-panel", Capability::AdminAny),
    ("/admin/bookings", Capability::BillingOnly),
    ("/admin/orders", Capability::EcommerceOnly),
    ("/admin/records", Capability::RecordsAccess),
    ("/admin/staff", Capability::SuperuserOnly),
];

/// Where unmapped destinations are sent.
pub const FALLBACK_PATH: &str = HOME_PATH;

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Match a concrete path against a pattern with `:param` segments.
fn matches_pattern(pattern: &str, path: &str) -> bool {
    let pattern = segments(pattern);
    let path = segments(path);
    pattern.len() == path.len()
        && pattern
            .iter()
            .zip(&path)
            .all(|(p, s)| p.starts_with(':') || p == s)
}

/// Capability required by `path`, ignoring any query string or fragment.
pub fn capability_for_path(path: &str) -> Option<Capability> {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    ROUTES
        .iter()
        .find(|(pattern, _)| matches_pattern(pattern, path))
        .map(|(_, capability)| *capability)
}

/// Authorize navigation to a concrete path.
///
/// Unmapped paths are redirected to [`FALLBACK_PATH`].
pub fn authorize_path(session: &Session, path: &str) -> RouteDecision {
    match capability_for_path(path) {
        Some(capability) => authorize(session, capability),
        None => RouteDecision::Redirect(FALLBACK_PATH),
    }
}

// ---------------------------------------------------------------------------
// Landing pages
// ---------------------------------------------------------------------------

/// Where a freshly signed-in user lands.
pub fn landing_after_login(roles: &RoleFlags, has_vehicle: bool) -> &'static str {
    if roles.is_any_staff() {
        ADMIN_PANEL_PATH
    } else if has_vehicle {
        HOME_PATH
    } else {
        SELECT_VEHICLE_PATH
    }
}

/// Where a user lands after choosing guest entry.
pub fn landing_after_guest_entry(has_vehicle: bool) -> &'static str {
    if has_vehicle {
        HOME_PATH
    } else {
        SELECT_VEHICLE_PATH
    }
}

// ---------------------------------------------------------------------------
// Admin dashboard tabs
// ---------------------------------------------------------------------------

/// Sections of the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTab {
    Bookings,
    Orders,
    Denting,
    Services,
    Parts,
}

impl AdminTab {
    pub const ALL: [AdminTab; 5] = [
        AdminTab::Bookings,
        AdminTab::Orders,
        AdminTab::Denting,
        AdminTab::Services,
        AdminTab::Parts,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AdminTab::Bookings => "Bookings",
            AdminTab::Orders => "Inventory Orders",
            AdminTab::Denting => "Bodywork",
            AdminTab::Services => "Services",
            AdminTab::Parts => "Stock Management",
        }
    }

    /// Roles that see this tab besides staff and superusers.
    fn granted_to(self) -> &'static [Role] {
        match self {
            AdminTab::Bookings => &[Role::Billing],
            AdminTab::Orders => &[Role::Ecommerce],
            AdminTab::Denting | AdminTab::Services => &[Role::Mechanic],
            AdminTab::Parts => &[Role::Mechanic, Role::Ecommerce],
        }
    }

    pub fn is_visible(self, session: &Session) -> bool {
        if !session.has_token() {
            return false;
        }
        let roles = &session.roles;
        roles.is_superuser || roles.is_staff || roles.has_any(self.granted_to())
    }
}

/// Admin tabs the session may see, in display order.
pub fn visible_admin_tabs(session: &Session) -> Vec<AdminTab> {
    AdminTab::ALL
        .into_iter()
        .filter(|tab| tab.is_visible(session))
        .collect()
}
