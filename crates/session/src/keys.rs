//! Persisted key names.
//!
//! Components outside the session store (navigation bar, dashboards) read
//! individual entries by these names, so they are part of the public
//! contract.

use workshop_core::roles::Role;

pub const ACCESS_TOKEN: &str = "access_token";
pub const REFRESH_TOKEN: &str = "refresh_token";
pub const IS_GUEST: &str = "is_guest";
pub const IS_STAFF: &str = "is_staff";
pub const IS_SUPERUSER: &str = "is_superuser";
pub const IS_MECHANIC: &str = "is_mechanic";
pub const IS_BILLING: &str = "is_billing";
pub const IS_ECOMMERCE: &str = "is_ecommerce";
/// JSON-encoded vehicle record.
pub const USER_VEHICLE: &str = "user_vehicle";
pub const USERNAME: &str = "username";

/// Stored string for a true flag. Anything else reads as false.
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";

/// Storage key holding a role flag.
pub fn role_key(role: Role) -> &'static str {
    // The backend's user-record field names double as storage keys.
    role.flag_name()
}

pub fn encode_flag(value: bool) -> &'static str {
    if value {
        TRUE
    } else {
        FALSE
    }
}

pub fn decode_flag(raw: Option<&str>) -> bool {
    raw == Some(TRUE)
}
