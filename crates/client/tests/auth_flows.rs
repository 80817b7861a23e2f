//! Integration tests for sign-in, guest entry, sign-out, vehicles and
//! payments.

mod common;

use assert_matches::assert_matches;
use serde_json::json;
use workshop_client::events::{AuthEvent, EndReason};
use workshop_client::ApiError;
use workshop_core::roles::{Role, RoleFlags};
use workshop_core::session::{Session, SessionKind, Vehicle, VehicleId, VehicleSelection};
use workshop_core::validation::{LoginCredentials, PasswordResetConfirm, Registration};

use common::{client_with, signed_in, ScriptedTransport};

fn login_body(user: serde_json::Value) -> serde_json::Value {
    json!({ "access": "t1", "refresh": "r1", "user": user })
}

fn swift() -> Vehicle {
    Vehicle {
        id: VehicleId::Number(3),
        make: "Maruti".into(),
        model: "Swift".into(),
        year: "2018".into(),
        license_plate: Some("MH12AB1234".into()),
    }
}

fn selection() -> VehicleSelection {
    VehicleSelection {
        make: "Hyundai".into(),
        model: "i20".into(),
        year: "2021".into(),
        license_plate: None,
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Staff land on the admin panel and their role flags are persisted.
#[tokio::test]
async fn staff_login_lands_on_admin_panel() {
    let transport = ScriptedTransport::new();
    transport.reply(
        200,
        login_body(json!({ "username": "meera", "is_billing": true, "has_vehicle": true })),
    );
    let client = client_with(transport.clone(), None);

    let outcome = client
        .login(&LoginCredentials::new(" meera ", "secret"))
        .await
        .unwrap();

    assert_eq!(outcome.landing, "/admin-panel");
    assert_eq!(transport.sent_paths(), vec!["/login/"]);

    let sent = transport.sent();
    assert_eq!(sent[0].header("authorization"), None);
    assert_eq!(sent[0].body, Some(json!({ "username": "meera", "password": "secret" })));

    let session = client.store().read();
    assert_eq!(session.kind(), SessionKind::Authenticated);
    assert_eq!(session.roles, RoleFlags::with(&[Role::Billing]));
    assert_eq!(session.username.as_deref(), Some("meera"));
}

/// Customers with a vehicle get it cached and land on home.
#[tokio::test]
async fn customer_with_vehicle_caches_first_vehicle() {
    let transport = ScriptedTransport::new();
    transport
        .reply(200, login_body(json!({ "username": "ravi", "has_vehicle": true })))
        .reply(
            200,
            json!([
                { "id": 3, "make": "Maruti", "model": "Swift", "year": 2018, "license_plate": "MH12AB1234" },
                { "id": 4, "make": "Tata", "model": "Nexon", "year": "2022" }
            ]),
        );
    let client = client_with(transport.clone(), None);

    let outcome = client.login(&LoginCredentials::new("ravi", "secret")).await.unwrap();

    assert_eq!(outcome.landing, "/home");
    assert_eq!(outcome.session.vehicle, Some(swift()));
    assert_eq!(transport.sent_paths(), vec!["/login/", "/vehicles/"]);
    assert_eq!(transport.sent()[1].bearer_token(), Some("t1"));
    assert_eq!(client.store().read().vehicle, Some(swift()));
}

#[tokio::test]
async fn customer_without_vehicle_selects_one() {
    let transport = ScriptedTransport::new();
    transport.reply(200, login_body(json!({ "username": "ravi", "has_vehicle": false })));
    let client = client_with(transport.clone(), None);

    let outcome = client.login(&LoginCredentials::new("ravi", "secret")).await.unwrap();

    assert_eq!(outcome.landing, "/select-vehicle");
    assert_eq!(transport.sent_count(), 1);
}

/// A failed vehicle fetch does not fail the sign-in.
#[tokio::test]
async fn vehicle_fetch_failure_is_not_fatal() {
    let transport = ScriptedTransport::new();
    transport
        .reply(200, login_body(json!({ "username": "ravi", "has_vehicle": true })))
        .reply_text(500, "boom");
    let client = client_with(transport.clone(), None);

    let outcome = client.login(&LoginCredentials::new("ravi", "secret")).await.unwrap();

    assert_eq!(outcome.landing, "/home");
    assert_eq!(client.store().read().vehicle, None);
    assert!(client.store().read().has_token());
}

#[tokio::test]
async fn login_without_user_block_lands_home() {
    let transport = ScriptedTransport::new();
    transport.reply(200, json!({ "access": "t1", "refresh": "r1" }));
    let client = client_with(transport.clone(), None);

    let outcome = client.login(&LoginCredentials::new("ravi", "secret")).await.unwrap();

    assert_eq!(outcome.landing, "/home");
    let session = client.store().read();
    assert_eq!(session.roles, RoleFlags::default());
    assert_eq!(session.username.as_deref(), Some("ravi"));
}

/// Wrong credentials are a plain 401: no refresh, nothing stored.
#[tokio::test]
async fn rejected_login_stores_nothing() {
    let transport = ScriptedTransport::new();
    transport.reply(401, json!({ "detail": "No active account found" }));
    let client = client_with(transport.clone(), None);

    let err = client
        .login(&LoginCredentials::new("ravi", "wrong"))
        .await
        .unwrap_err();

    assert_matches!(err, ApiError::Unauthorized { .. });
    assert_eq!(err.server_message().as_deref(), Some("No active account found"));
    assert_eq!(transport.sent_count(), 1);
    assert_eq!(client.store().read(), Session::default());
}

#[tokio::test]
async fn blank_credentials_never_reach_backend() {
    let transport = ScriptedTransport::new();
    let client = client_with(transport.clone(), None);

    let result = client.login(&LoginCredentials::new("   ", "secret")).await;

    assert_matches!(result, Err(ApiError::Validation(_)));
    assert_eq!(transport.sent_count(), 0);
}

// ---------------------------------------------------------------------------
// Guest entry and logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn guest_entry_without_vehicle_selects_one() {
    let client = client_with(ScriptedTransport::new(), Some(signed_in("t1", "r1")));

    let landing = client.enter_guest_mode().unwrap();

    assert_eq!(landing, "/select-vehicle");
    let session = client.store().read();
    assert_eq!(session.kind(), SessionKind::Guest);
    assert_eq!(session.access_token, None);
    assert_eq!(session.refresh_token, None);
}

#[tokio::test]
async fn guest_entry_keeps_cached_vehicle() {
    let client = client_with(
        ScriptedTransport::new(),
        Some(Session::default().with_vehicle(swift())),
    );

    let landing = client.enter_guest_mode().unwrap();

    assert_eq!(landing, "/home");
    assert_eq!(client.store().read().vehicle, Some(swift()));
}

#[tokio::test]
async fn logout_clears_and_signals_login() {
    let client = client_with(ScriptedTransport::new(), Some(signed_in("t1", "r1")));
    let mut events = client.subscribe();

    let landing = client.logout().unwrap();

    assert_eq!(landing, "/login");
    assert_eq!(client.store().read(), Session::default());
    assert_eq!(
        events.try_recv().unwrap(),
        AuthEvent::SessionEnded {
            redirect_to: "/login",
            reason: EndReason::LoggedOut,
        }
    );
}

// ---------------------------------------------------------------------------
// Registration and password reset
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_sends_normalised_payload() {
    let transport = ScriptedTransport::new();
    transport.reply(201, json!({ "id": 12 }));
    let client = client_with(transport.clone(), None);

    client
        .register(Registration {
            username: "ravi".into(),
            email: " Ravi@Example.com ".into(),
            password: "correct-horse".into(),
            confirm_password: "correct-horse".into(),
        })
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(transport.sent_paths(), vec!["/register/"]);
    assert_eq!(
        sent[0].body,
        Some(json!({
            "username": "ravi",
            "email": "ravi@example.com",
            "password": "correct-horse",
            "is_staff": false
        }))
    );
}

#[tokio::test]
async fn register_mismatch_is_rejected_locally() {
    let transport = ScriptedTransport::new();
    let client = client_with(transport.clone(), None);

    let result = client
        .register(Registration {
            username: "ravi".into(),
            email: "ravi@example.com".into(),
            password: "correct-horse".into(),
            confirm_password: "battery-staple".into(),
        })
        .await;

    assert_matches!(result, Err(ApiError::Validation(_)));
    assert_eq!(transport.sent_count(), 0);
}

#[tokio::test]
async fn password_reset_round() {
    let transport = ScriptedTransport::new();
    transport
        .reply(200, json!({ "message": "sent" }))
        .reply(200, json!({ "message": "reset" }));
    let client = client_with(transport.clone(), None);

    client.request_password_reset("ravi@example.com").await.unwrap();
    client
        .confirm_password_reset(PasswordResetConfirm {
            uid: "MQ".into(),
            token: "c2-abc".into(),
            new_password: "new-password".into(),
            confirm_password: "new-password".into(),
        })
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(
        transport.sent_paths(),
        vec!["/password-reset/", "/password-reset-confirm/"]
    );
    assert_eq!(sent[0].body, Some(json!({ "email": "ravi@example.com" })));
    assert_eq!(
        sent[1].body,
        Some(json!({ "uid": "MQ", "token": "c2-abc", "new_password": "new-password" }))
    );
}

#[tokio::test]
async fn password_reset_rejects_bad_email() {
    let transport = ScriptedTransport::new();
    let client = client_with(transport.clone(), None);

    let result = client.request_password_reset("not-an-email").await;

    assert_matches!(result, Err(ApiError::Validation(_)));
    assert_eq!(transport.sent_count(), 0);
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

/// Guests keep their vehicle locally; nothing is sent.
#[tokio::test]
async fn guest_vehicle_is_local() {
    let transport = ScriptedTransport::new();
    let client = client_with(transport.clone(), Some(Session::guest(None)));

    let vehicle = client.select_vehicle(selection()).await.unwrap();

    assert_eq!(vehicle.id, VehicleId::Text("guest_v_1".into()));
    assert_eq!(transport.sent_count(), 0);
    assert_eq!(client.store().read().vehicle, Some(vehicle));
}

#[tokio::test]
async fn signed_in_vehicle_is_registered() {
    let transport = ScriptedTransport::new();
    transport.reply(
        201,
        json!({ "id": 21, "make": "Hyundai", "model": "i20", "year": 2021, "license_plate": null }),
    );
    let client = client_with(transport.clone(), Some(signed_in("t1", "r1")));

    let vehicle = client.select_vehicle(selection()).await.unwrap();

    assert_eq!(vehicle.id, VehicleId::Number(21));
    assert_eq!(vehicle.year, "2021");
    assert_eq!(transport.sent()[0].bearer_token(), Some("t1"));
    assert_eq!(transport.sent()[0].body.as_ref().unwrap()["make"], "Hyundai");
    assert_eq!(client.store().read().vehicle, Some(vehicle));
}

#[tokio::test]
async fn anonymous_vehicle_selection_requires_login() {
    let client = client_with(ScriptedTransport::new(), None);

    let result = client.select_vehicle(selection()).await;

    assert_matches!(result, Err(ApiError::NotSignedIn { redirect_to: "/login" }));
}

#[tokio::test]
async fn incomplete_selection_is_rejected() {
    let client = client_with(ScriptedTransport::new(), Some(Session::guest(None)));
    let mut partial = selection();
    partial.model = " ".into();

    let result = client.select_vehicle(partial).await;

    assert_matches!(result, Err(ApiError::Validation(_)));
    assert_eq!(client.store().read().vehicle, None);
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn booking_payment_flow() {
    let transport = ScriptedTransport::new();
    transport
        .reply(200, json!({ "clientSecret": "pi_9_secret_x" }))
        .reply(200, json!({ "status": "Payment Verified" }));
    let client = client_with(transport.clone(), Some(signed_in("t1", "r1")));

    let intent = client.create_booking_payment_intent(9).await.unwrap();
    let verification = client.verify_booking_payment(9, "pi_9").await.unwrap();

    assert_eq!(intent.client_secret, "pi_9_secret_x");
    assert!(verification.is_verified());
    assert_eq!(
        transport.sent_paths(),
        vec!["/bookings/9/create_payment_intent/", "/bookings/9/verify_payment/"]
    );
    assert_eq!(transport.sent()[1].body, Some(json!({ "payment_intent_id": "pi_9" })));
}

#[tokio::test]
async fn part_order_checkout_flow() {
    let transport = ScriptedTransport::new();
    transport
        .reply(200, json!({ "clientSecret": "pi_5_secret", "order_id": 5 }))
        .reply(200, json!({ "status": "Payment Verified" }));
    let client = client_with(transport.clone(), Some(signed_in("t1", "r1")));

    let order = workshop_client::payments::PartOrderCheckout {
        part_id: 2,
        quantity: 1,
        vehicle_id: VehicleId::Number(3),
        phone_number: "9876543210".into(),
        shipping_address: "12 MG Road".into(),
    };
    let intent = client.checkout_part_order(&order).await.unwrap();
    let verification = client.verify_part_payment(intent.order_id, "pi_5").await.unwrap();

    assert_eq!(intent.order_id, 5);
    assert!(verification.is_verified());
    assert_eq!(
        transport.sent_paths(),
        vec!["/part-orders/checkout/", "/part-orders/5/verify_part_payment/"]
    );
}
