//! Payment intents for bookings and part orders.
//!
//! The backend creates the intent with the payment processor and returns its
//! client secret; confirmation happens outside this crate, after which the
//! intent id is handed back for verification.

use serde::{Deserialize, Serialize};
use workshop_core::session::VehicleId;
use workshop_core::types::DbId;

use crate::client::ApiClient;
use crate::error::ApiResult;

/// Status string the backend reports for a verified payment.
pub const PAYMENT_VERIFIED: &str = "Payment Verified";

/// Client secret of a freshly created payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

/// Order form for buying a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartOrderCheckout {
    pub part_id: DbId,
    pub quantity: u32,
    pub vehicle_id: VehicleId,
    pub phone_number: String,
    pub shipping_address: String,
}

/// Payment intent plus the order it pays for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartOrderIntent {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    pub order_id: DbId,
}

#[derive(Debug, Serialize)]
struct VerifyPayment<'a> {
    payment_intent_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentVerification {
    pub status: String,
}

impl PaymentVerification {
    pub fn is_verified(&self) -> bool {
        self.status == PAYMENT_VERIFIED
    }
}

impl ApiClient {
    pub async fn create_booking_payment_intent(&self, booking_id: DbId) -> ApiResult<PaymentIntent> {
        self.post_empty(&format!("/bookings/{booking_id}/create_payment_intent/"))
            .await
    }

    pub async fn verify_booking_payment(
        &self,
        booking_id: DbId,
        payment_intent_id: &str,
    ) -> ApiResult<PaymentVerification> {
        let verification: PaymentVerification = self
            .post_json(
                &format!("/bookings/{booking_id}/verify_payment/"),
                &VerifyPayment { payment_intent_id },
            )
            .await?;
        tracing::info!(booking_id, status = %verification.status, "Booking payment verified");
        Ok(verification)
    }

    pub async fn checkout_part_order(&self, order: &PartOrderCheckout) -> ApiResult<PartOrderIntent> {
        self.post_json("/part-orders/checkout/", order).await
    }

    pub async fn verify_part_payment(
        &self,
        order_id: DbId,
        payment_intent_id: &str,
    ) -> ApiResult<PaymentVerification> {
        let verification: PaymentVerification = self
            .post_json(
                &format!("/part-orders/{order_id}/verify_part_payment/"),
                &VerifyPayment { payment_intent_id },
            )
            .await?;
        tracing::info!(order_id, status = %verification.status, "Part order payment verified");
        Ok(verification)
    }
}
