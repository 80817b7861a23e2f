//! Persisted client session state.
//!
//! - [`store`] -- [`SessionStore`], typed reads and writes of the session.
//! - [`storage`] -- the key/value backends it sits on.
//! - [`keys`] -- the persisted entry names.

pub mod error;
pub mod keys;
pub mod storage;
pub mod store;

pub use error::StorageError;
pub use storage::{JsonFileStorage, KeyValueStorage, MemoryStorage};
pub use store::SessionStore;
