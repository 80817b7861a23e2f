//! The user's vehicles.

use workshop_core::error::CoreError;
use workshop_core::routes::LOGIN_PATH;
use workshop_core::session::{SessionKind, Vehicle, VehicleSelection};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};

pub const VEHICLES_ENDPOINT: &str = "/vehicles/";

impl ApiClient {
    /// Vehicles registered to the signed-in user.
    pub async fn list_vehicles(&self) -> ApiResult<Vec<Vehicle>> {
        self.get_json(VEHICLES_ENDPOINT).await
    }

    /// Choose the vehicle the rest of the app works with.
    ///
    /// Guests keep the vehicle locally under a fixed id. Signed-in users
    /// register it with the backend and cache what comes back.
    pub async fn select_vehicle(&self, selection: VehicleSelection) -> ApiResult<Vehicle> {
        if !selection.is_complete() {
            return Err(CoreError::Validation("make, model and year are required".into()).into());
        }

        let vehicle = match self.store().read().kind() {
            SessionKind::Guest => selection.into_guest_vehicle(),
            SessionKind::Authenticated => self.post_json(VEHICLES_ENDPOINT, &selection).await?,
            SessionKind::Anonymous => {
                return Err(ApiError::NotSignedIn {
                    redirect_to: LOGIN_PATH,
                })
            }
        };

        self.store().set_vehicle(&vehicle)?;
        tracing::info!(vehicle_id = %vehicle.id, "Vehicle selected");
        Ok(vehicle)
    }
}
