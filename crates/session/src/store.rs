//! The session store: typed access to the persisted session entries.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use workshop_core::roles::{Role, RoleFlags};
use workshop_core::session::{Session, Vehicle};

use crate::error::StorageError;
use crate::keys;
use crate::storage::{JsonFileStorage, KeyValueStorage, MemoryStorage};

/// Single source of truth for tokens, role flags and the cached vehicle.
///
/// Cheap to clone; clones share the same backend. Reads never fail: missing
/// or malformed entries resolve to their defaults.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// A store backed by [`MemoryStorage`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// A store persisted to a JSON file at `path`.
    pub fn open_file(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Ok(Self::new(Arc::new(JsonFileStorage::open(path)?)))
    }

    /// Current snapshot.
    pub fn read(&self) -> Session {
        decode(&self.storage.snapshot())
    }

    /// Replace every stored field with `session`.
    ///
    /// The session is normalised first, so a guest never persists tokens and
    /// role flags are never persisted without an access token.
    pub fn set(&self, session: &Session) -> Result<(), StorageError> {
        let session = session.clone().normalized();
        self.storage.replace_all(encode(&session))?;
        tracing::debug!(kind = ?session.kind(), "Session replaced");
        Ok(())
    }

    /// Swap in a freshly minted access token, leaving everything else alone.
    pub fn patch_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(keys::ACCESS_TOKEN, token)
    }

    /// Swap in a new access token only if the stored refresh token is still
    /// `expected_refresh`. Returns false, writing nothing, when the session
    /// was cleared or replaced in the meantime.
    pub fn patch_access_token_if(
        &self,
        expected_refresh: &str,
        token: &str,
    ) -> Result<bool, StorageError> {
        self.storage
            .set_if(keys::ACCESS_TOKEN, token, keys::REFRESH_TOKEN, expected_refresh)
    }

    /// Cache the user's selected vehicle.
    pub fn set_vehicle(&self, vehicle: &Vehicle) -> Result<(), StorageError> {
        let json = serde_json::to_string(vehicle)?;
        self.storage.set(keys::USER_VEHICLE, &json)
    }

    /// Remove every field.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.clear()?;
        tracing::debug!("Session cleared");
        Ok(())
    }

    /// Raw entry, for consumers that read individual keys.
    pub fn get(&self, key: &str) -> Option<String> {
        self.storage.get(key)
    }

    /// Boolean entry; anything other than `"true"` reads as false.
    pub fn flag(&self, key: &str) -> bool {
        keys::decode_flag(self.storage.get(key).as_deref())
    }
}

fn encode(session: &Session) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    if let Some(token) = &session.access_token {
        map.insert(keys::ACCESS_TOKEN.to_string(), token.clone());
    }
    if let Some(token) = &session.refresh_token {
        map.insert(keys::REFRESH_TOKEN.to_string(), token.clone());
    }
    map.insert(
        keys::IS_GUEST.to_string(),
        keys::encode_flag(session.is_guest).to_string(),
    );
    for role in Role::ALL {
        map.insert(
            keys::role_key(role).to_string(),
            keys::encode_flag(session.roles.has(role)).to_string(),
        );
    }
    if let Some(username) = &session.username {
        map.insert(keys::USERNAME.to_string(), username.clone());
    }
    if let Some(vehicle) = &session.vehicle {
        match serde_json::to_string(vehicle) {
            Ok(json) => {
                map.insert(keys::USER_VEHICLE.to_string(), json);
            }
            Err(e) => tracing::warn!(error = %e, "Vehicle not cached"),
        }
    }

    map
}

fn decode(map: &BTreeMap<String, String>) -> Session {
    let flag = |key: &str| keys::decode_flag(map.get(key).map(String::as_str));

    let mut roles = RoleFlags::default();
    for role in Role::ALL {
        roles.set(role, flag(keys::role_key(role)));
    }

    let vehicle = map.get(keys::USER_VEHICLE).and_then(|raw| {
        serde_json::from_str::<Vehicle>(raw)
            .map_err(|e| tracing::warn!(error = %e, "Ignoring unreadable cached vehicle"))
            .ok()
    });

    Session {
        access_token: non_empty(map.get(keys::ACCESS_TOKEN)),
        refresh_token: non_empty(map.get(keys::REFRESH_TOKEN)),
        is_guest: flag(keys::IS_GUEST),
        roles,
        username: non_empty(map.get(keys::USERNAME)),
        vehicle,
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use workshop_core::session::{SessionKind, VehicleId};

    use super::*;

    fn vehicle() -> Vehicle {
        Vehicle {
            id: VehicleId::Number(3),
            make: "Maruti".into(),
            model: "Swift".into(),
            year: "2018".into(),
            license_plate: Some("MH12AB1234".into()),
        }
    }

    #[test]
    fn empty_store_reads_defaults() {
        let store = SessionStore::in_memory();
        let session = store.read();
        assert_eq!(session, Session::default());
        assert_eq!(session.kind(), SessionKind::Anonymous);
    }

    #[test]
    fn set_then_read_round_trips() {
        let store = SessionStore::in_memory();
        let session = Session::authenticated("t1", "r1", RoleFlags::with(&[Role::Billing]))
            .with_username("ana")
            .with_vehicle(vehicle());

        store.set(&session).unwrap();
        assert_eq!(store.read(), session);
    }

    #[test]
    fn flags_are_stored_as_strings() {
        let store = SessionStore::in_memory();
        store
            .set(&Session::authenticated("t1", "r1", RoleFlags::with(&[Role::Mechanic])))
            .unwrap();

        assert_eq!(store.get(keys::IS_MECHANIC).as_deref(), Some("true"));
        assert_eq!(store.get(keys::IS_BILLING).as_deref(), Some("false"));
        assert_eq!(store.get(keys::IS_GUEST).as_deref(), Some("false"));
        assert!(store.flag(keys::IS_MECHANIC));
    }

    #[test]
    fn guest_set_never_persists_tokens() {
        let store = SessionStore::in_memory();
        let mut session = Session::guest(None);
        session.access_token = Some("leaked".into());
        session.refresh_token = Some("leaked".into());

        store.set(&session).unwrap();

        assert_eq!(store.get(keys::ACCESS_TOKEN), None);
        assert_eq!(store.get(keys::REFRESH_TOKEN), None);
        assert_eq!(store.read().kind(), SessionKind::Guest);
    }

    #[test]
    fn set_replaces_previous_fields() {
        let store = SessionStore::in_memory();
        store
            .set(&Session::authenticated("t1", "r1", RoleFlags::with(&[Role::Staff])).with_username("ana"))
            .unwrap();
        store.set(&Session::guest(None)).unwrap();

        let session = store.read();
        assert_eq!(session.username, None);
        assert_eq!(session.roles, RoleFlags::default());
    }

    #[test]
    fn patch_leaves_other_fields() {
        let store = SessionStore::in_memory();
        let session = Session::authenticated("t1", "r1", RoleFlags::with(&[Role::Superuser]));
        store.set(&session).unwrap();

        store.patch_access_token("t2").unwrap();

        let after = store.read();
        assert_eq!(after.access_token.as_deref(), Some("t2"));
        assert_eq!(after.refresh_token.as_deref(), Some("r1"));
        assert_eq!(after.roles, session.roles);
    }

    #[test]
    fn conditional_patch_needs_matching_refresh_token() {
        let store = SessionStore::in_memory();
        store
            .set(&Session::authenticated("t1", "r1", RoleFlags::with(&[Role::Billing])))
            .unwrap();

        assert!(!store.patch_access_token_if("r0", "t2").unwrap());
        assert_eq!(store.read().access_token.as_deref(), Some("t1"));

        assert!(store.patch_access_token_if("r1", "t2").unwrap());
        assert_eq!(store.read().access_token.as_deref(), Some("t2"));
    }

    #[test]
    fn conditional_patch_after_clear_writes_nothing() {
        let store = SessionStore::in_memory();
        store
            .set(&Session::authenticated("t1", "r1", RoleFlags::default()))
            .unwrap();
        store.clear().unwrap();

        assert!(!store.patch_access_token_if("r1", "t2").unwrap());
        assert_eq!(store.read(), Session::default());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = SessionStore::in_memory();
        store
            .set(&Session::authenticated("t1", "r1", RoleFlags::with(&[Role::Staff])))
            .unwrap();

        store.clear().unwrap();
        let first = store.read();
        store.clear().unwrap();
        let second = store.read();

        assert_eq!(first, Session::default());
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_vehicle_reads_as_absent() {
        let store = SessionStore::in_memory();
        store.storage.set(keys::USER_VEHICLE, "{oops").unwrap();
        assert_eq!(store.read().vehicle, None);
    }

    #[test]
    fn set_vehicle_keeps_tokens() {
        let store = SessionStore::in_memory();
        store
            .set(&Session::authenticated("t1", "r1", RoleFlags::default()))
            .unwrap();
        store.set_vehicle(&vehicle()).unwrap();

        let session = store.read();
        assert_eq!(session.access_token.as_deref(), Some("t1"));
        assert_eq!(session.vehicle, Some(vehicle()));
    }

    #[test]
    fn clones_share_state() {
        let store = SessionStore::in_memory();
        let other = store.clone();
        store.set(&Session::guest(None)).unwrap();
        assert!(other.read().is_guest);
    }
}
