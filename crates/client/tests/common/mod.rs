//! Shared fixtures for client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use workshop_client::{ApiClient, ApiResponse, OutboundRequest, Transport, TransportError};
use workshop_core::roles::RoleFlags;
use workshop_core::session::Session;
use workshop_session::SessionStore;

pub const BASE_URL: &str = "http://backend.test/api";

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

/// Replays queued replies in order and records every request it was sent.
///
/// Running out of replies is a test bug and answers 599 so the assertion
/// that follows fails loudly.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, status: u16, body: Value) -> &Self {
        self.replies
            .lock()
            .push_back(Ok(ApiResponse::json_body(status, &body)));
        self
    }

    pub fn reply_text(&self, status: u16, body: &str) -> &Self {
        self.replies.lock().push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.replies
            .lock()
            .push_back(Err(TransportError::Unreachable(message.to_string())));
        self
    }

    pub fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Paths of every request sent, relative to [`BASE_URL`].
    pub fn sent_paths(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|r| r.url.trim_start_matches(BASE_URL).to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().push(request);
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(599, "no scripted reply")))
    }
}

// ---------------------------------------------------------------------------
// Client helpers
// ---------------------------------------------------------------------------

pub fn client_with(transport: Arc<dyn Transport>, session: Option<Session>) -> ApiClient {
    let store = SessionStore::in_memory();
    if let Some(session) = session {
        store.set(&session).unwrap();
    }
    ApiClient::with_transport(BASE_URL, transport, store)
}

pub fn signed_in(access: &str, refresh: &str) -> Session {
    Session::authenticated(access, refresh, RoleFlags::default()).with_username("ravi")
}

/// Authenticated session that never received a refresh token.
pub fn access_only(access: &str) -> Session {
    Session {
        access_token: Some(access.to_string()),
        username: Some("ravi".to_string()),
        ..Session::default()
    }
}
