//! The client-side session snapshot.
//!
//! A [`Session`] is what the session store hands out on every read: the
//! current tokens, the guest flag, the role flags and the cached vehicle.
//! It is a plain value; persistence lives in `workshop-session`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::roles::RoleFlags;

/// Identifier given to vehicles selected during a guest session.
pub const GUEST_VEHICLE_ID: &str = "guest_v_1";

/// Which of the three mutually exclusive states a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Holds a backend-issued access token.
    Authenticated,
    /// Explicitly entered as a guest; never holds tokens.
    Guest,
    /// Nothing stored.
    Anonymous,
}

/// Backend id of a vehicle. Guest vehicles carry a local string id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VehicleId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleId::Number(n) => write!(f, "{n}"),
            VehicleId::Text(s) => f.write_str(s),
        }
    }
}

/// Cached profile of the user's selected vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub make: String,
    pub model: String,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default)]
    pub license_plate: Option<String>,
}

/// Vehicle fields chosen in the selector, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSelection {
    pub make: String,
    pub model: String,
    pub year: String,
    #[serde(default)]
    pub license_plate: Option<String>,
}

impl VehicleSelection {
    /// True when make, model and year are all filled in.
    pub fn is_complete(&self) -> bool {
        !self.make.trim().is_empty() && !self.model.trim().is_empty() && !self.year.trim().is_empty()
    }

    /// Turn the selection into a locally identified guest vehicle.
    pub fn into_guest_vehicle(self) -> Vehicle {
        Vehicle {
            id: VehicleId::Text(GUEST_VEHICLE_ID.to_string()),
            make: self.make,
            model: self.model,
            year: self.year,
            license_plate: self.license_plate,
        }
    }
}

/// Snapshot of everything the client knows about the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_guest: bool,
    pub roles: RoleFlags,
    pub username: Option<String>,
    pub vehicle: Option<Vehicle>,
}

impl Session {
    /// A session populated from a successful login.
    pub fn authenticated(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        roles: RoleFlags,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            roles,
            ..Self::default()
        }
    }

    /// A guest session, optionally carrying a previously chosen vehicle.
    pub fn guest(vehicle: Option<Vehicle>) -> Self {
        Self {
            is_guest: true,
            vehicle,
            ..Self::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicle = Some(vehicle);
        self
    }

    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn kind(&self) -> SessionKind {
        if self.is_guest {
            SessionKind::Guest
        } else if self.access_token.is_some() {
            SessionKind::Authenticated
        } else {
            SessionKind::Anonymous
        }
    }

    /// Drop fields that may not coexist.
    ///
    /// Guests never hold tokens or roles, and role flags without an access
    /// token carry no meaning.
    pub fn normalized(mut self) -> Self {
        if self.is_guest {
            self.access_token = None;
            self.refresh_token = None;
            self.roles = RoleFlags::default();
        }
        if self.access_token.is_none() {
            self.roles = RoleFlags::default();
        }
        self
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
