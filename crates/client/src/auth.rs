//! Sign-in, guest entry, sign-out and account recovery.

use serde::Deserialize;
use validator::Validate;
use workshop_core::error::CoreError;
use workshop_core::roles::RoleFlags;
use workshop_core::routes::{landing_after_guest_entry, landing_after_login, HOME_PATH, LOGIN_PATH};
use workshop_core::session::{Session, Vehicle};
use workshop_core::validation::{
    LoginCredentials, PasswordResetConfirm, PasswordResetRequest, Registration,
};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::events::{AuthEvent, EndReason};
use crate::request::ApiRequest;

pub const LOGIN_ENDPOINT: &str = "/login/";
pub const REGISTER_ENDPOINT: &str = "/register/";
pub const PASSWORD_RESET_ENDPOINT: &str = "/password-reset/";
pub const PASSWORD_RESET_CONFIRM_ENDPOINT: &str = "/password-reset-confirm/";

/// Body of a successful `POST /login/`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

/// Profile block of the login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(flatten)]
    pub roles: RoleFlags,
    #[serde(default)]
    pub has_vehicle: bool,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Page the user should land on.
    pub landing: &'static str,
    /// The session as stored.
    pub session: Session,
}

impl ApiClient {
    /// Sign in and replace the stored session.
    ///
    /// Staff of any kind land on the admin panel. Customers who already own
    /// a vehicle land on the home page with their first vehicle cached;
    /// everyone else is sent to pick one.
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<LoginOutcome> {
        let credentials = credentials.checked()?;
        let body = serde_json::to_value(&credentials)?;

        let response = self
            .execute_public(ApiRequest::post(LOGIN_ENDPOINT).json(body))
            .await?;
        let login: LoginResponse = response.json()?;

        let Some(user) = login.user else {
            let session = Session::authenticated(login.access, login.refresh, RoleFlags::default())
                .with_username(credentials.username);
            self.store().set(&session)?;
            tracing::info!("Signed in without profile, landing on home");
            return Ok(LoginOutcome {
                landing: HOME_PATH,
                session: self.store().read(),
            });
        };

        let mut session = Session::authenticated(login.access, login.refresh, user.roles)
            .with_username(user.username.unwrap_or(credentials.username));
        self.store().set(&session)?;

        let landing = landing_after_login(&user.roles, user.has_vehicle);
        if !user.roles.is_any_staff() && user.has_vehicle {
            match self.list_vehicles().await {
                Ok(vehicles) => {
                    if let Some(vehicle) = vehicles.into_iter().next() {
                        self.store().set_vehicle(&vehicle)?;
                        session = session.with_vehicle(vehicle);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Could not fetch vehicles after sign-in"),
            }
        }

        tracing::info!(
            clearance = user.roles.clearance_label(),
            landing,
            "Signed in"
        );
        Ok(LoginOutcome { landing, session })
    }

    /// Continue without an account. Any vehicle cached earlier is kept.
    pub fn enter_guest_mode(&self) -> ApiResult<&'static str> {
        let vehicle: Option<Vehicle> = self.store().read().vehicle;
        let landing = landing_after_guest_entry(vehicle.is_some());
        self.store().set(&Session::guest(vehicle))?;
        tracing::info!(landing, "Entered guest mode");
        Ok(landing)
    }

    /// Forget the session and return the login page.
    pub fn logout(&self) -> ApiResult<&'static str> {
        self.store().clear()?;
        self.publish(AuthEvent::SessionEnded {
            redirect_to: LOGIN_PATH,
            reason: EndReason::LoggedOut,
        });
        tracing::info!("Signed out");
        Ok(LOGIN_PATH)
    }

    /// Create a customer account. The caller signs in separately.
    pub async fn register(&self, registration: Registration) -> ApiResult<()> {
        let payload = registration.into_payload()?;
        let body = serde_json::to_value(&payload)?;
        self.execute_public(ApiRequest::post(REGISTER_ENDPOINT).json(body))
            .await?;
        tracing::info!("Account registered");
        Ok(())
    }

    /// Ask the backend to email a recovery link.
    pub async fn request_password_reset(&self, email: &str) -> ApiResult<()> {
        let request = PasswordResetRequest {
            email: email.trim().to_string(),
        };
        request.validate().map_err(CoreError::from)?;
        let body = serde_json::to_value(&request)?;
        self.execute_public(ApiRequest::post(PASSWORD_RESET_ENDPOINT).json(body))
            .await?;
        Ok(())
    }

    /// Set a new password using the uid and token from a recovery link.
    pub async fn confirm_password_reset(&self, confirm: PasswordResetConfirm) -> ApiResult<()> {
        let payload = confirm.into_payload()?;
        let body = serde_json::to_value(&payload)?;
        self.execute_public(ApiRequest::post(PASSWORD_RESET_CONFIRM_ENDPOINT).json(body))
            .await?;
        Ok(())
    }
}
