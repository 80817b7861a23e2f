//! Session lifecycle notifications.
//!
//! The client does not navigate. When it refreshes a token or discards a
//! session it publishes an [`AuthEvent`] on a broadcast channel; whatever
//! drives navigation subscribes via
//! [`ApiClient::subscribe`](crate::ApiClient::subscribe).

use tokio::sync::broadcast;

/// Capacity of the auth event channel. Slow subscribers lose the oldest
/// events rather than blocking the client.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Why a session was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// A 401 arrived and there was no refresh token to try.
    NoRefreshToken,
    /// The refresh call itself failed.
    RefreshFailed,
    /// The user signed out.
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A new access token was stored.
    TokenRefreshed,
    /// The session store was cleared; navigate to `redirect_to`.
    SessionEnded {
        redirect_to: &'static str,
        reason: EndReason,
    },
}

pub(crate) fn channel() -> broadcast::Sender<AuthEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}
