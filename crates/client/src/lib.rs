//! HTTP client for the workshop backend.
//!
//! [`ApiClient`] attaches the stored access token to every call, refreshes
//! it once on a 401, and clears the session when recovery is impossible.
//! Typed wrappers for sign-in, vehicles and payments live alongside it.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod payments;
pub mod request;
pub mod transport;
pub mod vehicles;

pub use auth::{LoginOutcome, LoginResponse};
pub use client::{on_unauthorized, ApiClient, UnauthorizedAction};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use events::{AuthEvent, EndReason};
pub use request::{ApiRequest, PendingRequest};
pub use transport::{ApiResponse, HttpTransport, OutboundRequest, Transport, TransportError};
