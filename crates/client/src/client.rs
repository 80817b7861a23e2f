//! The authenticated API client.
//!
//! Every backend call goes through [`ApiClient::execute`], which attaches the
//! stored access token and runs the recovery protocol on the response:
//!
//! | Response | Session | Action |
//! |---|---|---|
//! | 2xx | any | pass through |
//! | 401, first attempt | guest | reject, nothing else |
//! | 401, first attempt | refresh token present | refresh, store token, resend once |
//! | 401, first attempt | no refresh token | clear session, signal `/login` |
//! | 401, already resent | any | reject |
//! | 403 | any | reject, session untouched |
//! | refresh fails | any | clear session, signal `/login?error=expired` |
//! | refresh lands after the session was cleared | any | discard the new token |
//!
//! Refreshes are serialised: a request whose 401 arrives after another
//! request already installed a newer token resends with that token instead
//! of refreshing again, and one that waited on a refresh that failed shares
//! its expired outcome.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use workshop_core::routes::{LOGIN_PATH, SESSION_EXPIRED_PATH};
use workshop_core::session::Session;
use workshop_session::SessionStore;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::events::{self, AuthEvent, EndReason};
use crate::request::{ApiRequest, PendingRequest};
use crate::transport::{ApiResponse, HttpTransport, OutboundRequest, Transport};

/// Path of the token refresh endpoint.
pub const REFRESH_ENDPOINT: &str = "/token/refresh/";

/// Header carrying the per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// What to do about a 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedAction {
    /// Reject the call without touching the session.
    Propagate,
    /// Exchange the refresh token, then resend.
    Refresh { refresh_token: String },
    /// Discard the session and send the user to the login page.
    EndSession,
}

/// Decide how to handle a 401 for `pending` given the current session.
pub fn on_unauthorized(session: &Session, pending: &PendingRequest) -> UnauthorizedAction {
    if pending.retries_exhausted() || session.is_guest {
        return UnauthorizedAction::Propagate;
    }
    match &session.refresh_token {
        Some(refresh_token) => UnauthorizedAction::Refresh {
            refresh_token: refresh_token.clone(),
        },
        None => UnauthorizedAction::EndSession,
    }
}

/// State kept behind the refresh gate.
#[derive(Debug, Default)]
struct RefreshGate {
    /// Access token whose refresh last failed. Requests that were rejected
    /// with it while waiting on the gate share that outcome.
    expired_access: Option<String>,
}

/// Sole gateway for backend calls.
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    store: SessionStore,
    events: broadcast::Sender<AuthEvent>,
    refresh_gate: Mutex<RefreshGate>,
}

impl ApiClient {
    /// Build a client with an [`HttpTransport`] configured from `config`.
    pub fn new(config: &ClientConfig, store: SessionStore) -> ApiResult<Self> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(
            config.base_url.clone(),
            Arc::new(transport),
            store,
        ))
    }

    /// Build a client over any [`Transport`].
    pub fn with_transport(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        store: SessionStore,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            store,
            events: events::channel(),
            refresh_gate: Mutex::new(RefreshGate::default()),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Receive session lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ---- authenticated calls ----

    /// Send `request` with the stored bearer token and run the recovery
    /// protocol on the response.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let mut pending = PendingRequest::new(request);

        loop {
            let session = self.store.read();
            let token = if session.is_guest {
                None
            } else {
                session.access_token
            };

            let response = self.dispatch(&pending, token.as_deref()).await?;

            if response.is_success() {
                return Ok(response);
            }

            match response.status {
                401 => {
                    self.recover_unauthorized(&pending, token.as_deref(), response)
                        .await?;
                    pending = pending.retry();
                    tracing::debug!(
                        request_id = %pending.id(),
                        attempt = pending.attempt(),
                        "Resending after token refresh"
                    );
                }
                403 => {
                    tracing::warn!(
                        request_id = %pending.id(),
                        path = %pending.request().path,
                        "Access denied: insufficient permissions"
                    );
                    return Err(ApiError::Forbidden {
                        body: response.body,
                    });
                }
                status => {
                    return Err(ApiError::Status {
                        status,
                        body: response.body,
                    });
                }
            }
        }
    }

    /// `GET path` decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.execute(ApiRequest::get(path)).await?;
        Ok(response.json()?)
    }

    /// `POST path` with a JSON body, decoded as JSON.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(path).json(serde_json::to_value(body)?);
        let response = self.execute(request).await?;
        Ok(response.json()?)
    }

    /// `POST path` without a body, decoded as JSON.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.execute(ApiRequest::post(path)).await?;
        Ok(response.json()?)
    }

    // ---- public calls ----

    /// Send `request` with no bearer token and no recovery protocol.
    ///
    /// Used for login, registration, password reset and token refresh.
    pub(crate) async fn execute_public(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let pending = PendingRequest::new(request);
        let response = self.dispatch(&pending, None).await?;
        if response.is_success() {
            return Ok(response);
        }
        Err(match response.status {
            401 => ApiError::Unauthorized {
                body: response.body,
            },
            403 => ApiError::Forbidden {
                body: response.body,
            },
            status => ApiError::Status {
                status,
                body: response.body,
            },
        })
    }

    /// Publish an auth event. Having no subscribers is fine.
    pub(crate) fn publish(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    // ---- private helpers ----

    async fn dispatch(
        &self,
        pending: &PendingRequest,
        token: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let request = pending.request();

        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("authorization"))
            .cloned()
            .collect();
        headers.push((REQUEST_ID_HEADER.to_string(), pending.id().to_string()));
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let outbound = OutboundRequest {
            method: request.method.clone(),
            url: self.url(&request.path),
            headers,
            body: request.body.clone(),
        };

        tracing::debug!(
            request_id = %pending.id(),
            method = %outbound.method,
            path = %request.path,
            attempt = pending.attempt(),
            authenticated = token.is_some(),
            "Sending API request"
        );

        match self.transport.send(outbound).await {
            Ok(response) => {
                tracing::debug!(request_id = %pending.id(), status = response.status, "API response");
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(request_id = %pending.id(), error = %e, "API request failed");
                Err(e.into())
            }
        }
    }

    /// Handle a 401. `Ok` means the caller should resend; `Err` is the error
    /// to surface.
    async fn recover_unauthorized(
        &self,
        pending: &PendingRequest,
        sent_token: Option<&str>,
        response: ApiResponse,
    ) -> ApiResult<()> {
        let mut gate = self.refresh_gate.lock().await;
        let session = self.store.read();

        if session.access_token.is_none()
            && sent_token.is_some()
            && gate.expired_access.as_deref() == sent_token
        {
            tracing::debug!(request_id = %pending.id(), "Session already expired by another request");
            return Err(ApiError::SessionExpired {
                redirect_to: SESSION_EXPIRED_PATH,
            });
        }

        match on_unauthorized(&session, pending) {
            UnauthorizedAction::Propagate => Err(ApiError::Unauthorized {
                body: response.body,
            }),
            UnauthorizedAction::EndSession => {
                tracing::info!(request_id = %pending.id(), "Unauthorized without refresh token, ending session");
                self.end_session(LOGIN_PATH, EndReason::NoRefreshToken)?;
                Err(ApiError::SessionExpired {
                    redirect_to: LOGIN_PATH,
                })
            }
            UnauthorizedAction::Refresh { refresh_token } => {
                if session.access_token.is_some() && session.access_token.as_deref() != sent_token
                {
                    tracing::debug!(request_id = %pending.id(), "Token already refreshed by another request");
                    return Ok(());
                }

                match self.refresh_access_token(&refresh_token).await {
                    Ok(access) => {
                        if !self.store.patch_access_token_if(&refresh_token, &access)? {
                            tracing::info!(request_id = %pending.id(), "Session ended during refresh, discarding new token");
                            return Err(ApiError::SessionExpired {
                                redirect_to: LOGIN_PATH,
                            });
                        }
                        gate.expired_access = None;
                        self.publish(AuthEvent::TokenRefreshed);
                        tracing::info!(request_id = %pending.id(), "Access token refreshed");
                        Ok(())
                    }
                    Err(e) => {
                        tracing::error!(request_id = %pending.id(), error = %e, "Refresh token expired, logging out");
                        gate.expired_access = sent_token.map(str::to_string);
                        self.end_session(SESSION_EXPIRED_PATH, EndReason::RefreshFailed)?;
                        Err(ApiError::SessionExpired {
                            redirect_to: SESSION_EXPIRED_PATH,
                        })
                    }
                }
            }
        }
    }

    /// Exchange a refresh token for a new access token.
    async fn refresh_access_token(&self, refresh_token: &str) -> ApiResult<String> {
        let body = serde_json::to_value(RefreshRequest {
            refresh: refresh_token,
        })?;
        let response = self
            .execute_public(ApiRequest::post(REFRESH_ENDPOINT).json(body))
            .await?;
        let refreshed: RefreshResponse = response.json()?;
        Ok(refreshed.access)
    }

    fn end_session(&self, redirect_to: &'static str, reason: EndReason) -> ApiResult<()> {
        self.store.clear()?;
        self.publish(AuthEvent::SessionEnded {
            redirect_to,
            reason,
        });
        Ok(())
    }
}
