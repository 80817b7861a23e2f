//! Subcommand handlers. Each returns the text to print.

use anyhow::{Context, Result};
use workshop_client::{ApiClient, ApiRequest};
use workshop_core::access::RouteDecision;
use workshop_core::routes::{authorize_path, visible_admin_tabs};
use workshop_core::session::{Session, SessionKind, VehicleSelection};
use workshop_core::validation::{LoginCredentials, PasswordResetConfirm, Registration};

use crate::cli::Command;

pub async fn run(client: &ApiClient, command: Command) -> Result<String> {
    match command {
        Command::Login { username, password } => {
            let outcome = client
                .login(&LoginCredentials::new(username, password))
                .await
                .context("Sign-in failed")?;
            Ok(format!(
                "Signed in as {}\nNext: {}",
                outcome.session.username.as_deref().unwrap_or("-"),
                outcome.landing
            ))
        }
        Command::Guest => {
            let landing = client.enter_guest_mode()?;
            Ok(format!("Continuing as guest\nNext: {landing}"))
        }
        Command::Logout => {
            let landing = client.logout()?;
            Ok(format!("Signed out\nNext: {landing}"))
        }
        Command::Whoami => Ok(describe(&client.store().read())),
        Command::Can { path } => Ok(match authorize_path(&client.store().read(), &path) {
            RouteDecision::Allow => format!("allow {path}"),
            RouteDecision::Redirect(target) => format!("deny {path} -> {target}"),
        }),
        Command::Register {
            username,
            email,
            password,
            confirm,
        } => {
            client
                .register(Registration {
                    username,
                    email,
                    password,
                    confirm_password: confirm,
                })
                .await
                .context("Registration failed")?;
            Ok("Account created, sign in to continue".to_string())
        }
        Command::ResetPassword { email } => {
            client.request_password_reset(&email).await?;
            Ok(format!("Recovery link sent to {email}"))
        }
        Command::ConfirmReset {
            uid,
            token,
            password,
            confirm,
        } => {
            client
                .confirm_password_reset(PasswordResetConfirm {
                    uid,
                    token,
                    new_password: password,
                    confirm_password: confirm,
                })
                .await?;
            Ok("Password updated".to_string())
        }
        Command::Vehicles => {
            let vehicles = client.list_vehicles().await?;
            Ok(serde_json::to_string_pretty(&vehicles)?)
        }
        Command::SelectVehicle {
            make,
            model,
            year,
            plate,
        } => {
            let vehicle = client
                .select_vehicle(VehicleSelection {
                    make,
                    model,
                    year,
                    license_plate: plate,
                })
                .await?;
            Ok(format!(
                "Selected {} {} {} (id {})",
                vehicle.year, vehicle.make, vehicle.model, vehicle.id
            ))
        }
        Command::PayBooking { booking_id } => {
            let intent = client.create_booking_payment_intent(booking_id).await?;
            Ok(format!("client_secret: {}", intent.client_secret))
        }
        Command::VerifyBooking {
            booking_id,
            payment_intent_id,
        } => {
            let verification = client
                .verify_booking_payment(booking_id, &payment_intent_id)
                .await?;
            Ok(verification.status)
        }
        Command::Get { path } => send(client, ApiRequest::get(path), None).await,
        Command::Post { path, body } => send(client, ApiRequest::post(path), body).await,
        Command::Put { path, body } => send(client, ApiRequest::put(path), body).await,
        Command::Patch { path, body } => send(client, ApiRequest::patch(path), body).await,
        Command::Delete { path } => send(client, ApiRequest::delete(path), None).await,
    }
}

async fn send(client: &ApiClient, mut request: ApiRequest, body: Option<String>) -> Result<String> {
    if let Some(raw) = body {
        let json: serde_json::Value =
            serde_json::from_str(&raw).context("--body is not valid JSON")?;
        request = request.json(json);
    }
    let response = client.execute(request).await?;
    Ok(pretty(&response.body))
}

/// Human-readable summary of a session. Tokens are never shown.
pub fn describe(session: &Session) -> String {
    let mut lines = Vec::new();
    match session.kind() {
        SessionKind::Anonymous => lines.push("Not signed in".to_string()),
        SessionKind::Guest => lines.push("Guest".to_string()),
        SessionKind::Authenticated => {
            lines.push(format!(
                "Signed in as {}",
                session.username.as_deref().unwrap_or("-")
            ));
            lines.push(format!("Clearance: {}", session.roles.clearance_label()));
            if let Some(badge) = session.roles.badge() {
                lines.push(format!("Badge: {badge}"));
            }
            let tabs: Vec<&str> = visible_admin_tabs(session)
                .into_iter()
                .map(|tab| tab.label())
                .collect();
            if !tabs.is_empty() {
                lines.push(format!("Admin tabs: {}", tabs.join(", ")));
            }
        }
    }
    if let Some(vehicle) = &session.vehicle {
        lines.push(format!(
            "Vehicle: {} {} {} (id {})",
            vehicle.year, vehicle.make, vehicle.model, vehicle.id
        ));
    }
    lines.join("\n")
}

fn pretty(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| body.to_string())
}
