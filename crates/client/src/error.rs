use workshop_core::error::CoreError;
use workshop_session::StorageError;

use crate::transport::TransportError;

/// Errors surfaced to callers of [`ApiClient`](crate::ApiClient).
///
/// The client never swallows a failure: a call either resolves (possibly
/// after one transparent refresh and resend) or rejects with one of these.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was obtained. Never retried; the session is untouched.
    #[error(transparent)]
    Network(#[from] TransportError),

    /// 401 that could not be recovered: a guest session, or the resend after
    /// a refresh was rejected as well.
    #[error("Unauthorized: {body}")]
    Unauthorized { body: String },

    /// The session was discarded; the caller should navigate to `redirect_to`.
    #[error("Session expired, redirect to {redirect_to}")]
    SessionExpired { redirect_to: &'static str },

    /// 403: the credentials are valid but lack the privilege. The session is
    /// left intact.
    #[error("Forbidden: {body}")]
    Forbidden { body: String },

    /// Any other non-2xx response.
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response body was not the JSON the call expects.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Persisting the session failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Local input validation rejected the call before anything was sent.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// The operation needs a guest or signed-in session.
    #[error("Not signed in, redirect to {redirect_to}")]
    NotSignedIn { redirect_to: &'static str },
}

/// Convenience type alias for client call results.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status of the rejected response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Where the caller should navigate, for errors that end or require a
    /// session.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            ApiError::SessionExpired { redirect_to } | ApiError::NotSignedIn { redirect_to } => {
                Some(*redirect_to)
            }
            _ => None,
        }
    }

    /// Human-readable message from the backend's `detail` or `error` field.
    pub fn server_message(&self) -> Option<String> {
        let body = match self {
            ApiError::Unauthorized { body }
            | ApiError::Forbidden { body }
            | ApiError::Status { body, .. } => body,
            _ => return None,
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        ["detail", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
    }
}
