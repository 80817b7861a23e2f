//! Pure domain logic for the workshop client.
//!
//! - [`session`] -- the session snapshot, its kinds and the cached vehicle.
//! - [`roles`] -- staff role flags.
//! - [`access`] -- capability classes and the route authorizer.
//! - [`routes`] -- the route table, landing pages and admin tab visibility.
//! - [`validation`] -- account form validation.
//!
//! Nothing here performs I/O.

pub mod access;
pub mod error;
pub mod roles;
pub mod routes;
pub mod session;
pub mod types;
pub mod validation;
