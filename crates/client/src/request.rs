//! Request descriptions and the per-call attempt counter.

use std::sync::Arc;

use reqwest::Method;
use uuid::Uuid;

/// Maximum number of automatic resends after a token refresh.
pub const MAX_AUTH_RETRIES: u32 = 1;

/// What the caller wants sent, relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// One outbound call in flight.
///
/// The description is shared, never mutated; each resend produces a new
/// `PendingRequest` with a higher attempt number and the same id.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    id: Uuid,
    request: Arc<ApiRequest>,
    attempt: u32,
}

impl PendingRequest {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request: Arc::new(request),
            attempt: 0,
        }
    }

    /// Correlation id, stable across resends.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// Zero for the original send, incremented per resend.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn retries_exhausted(&self) -> bool {
        self.attempt >= MAX_AUTH_RETRIES
    }

    /// The next attempt of the same call.
    pub fn retry(&self) -> Self {
        Self {
            id: self.id,
            request: Arc::clone(&self.request),
            attempt: self.attempt + 1,
        }
    }
}
