//! Appointment pricing.

use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::appointment::Location;
use pathlab_core::models::service::Service;

/// Flat surcharge for home sample collection, in whole currency units.
pub const HOME_COLLECTION_SURCHARGE: i64 = 100;

/// Final price for booking `service` at `location`.
///
/// Home collection adds the flat surcharge and is only available for
/// services that offer it.
pub fn quote(service: &Service, location: Location) -> PortalResult<i64> {
    match location {
        Location::Lab => Ok(service.price),
        Location::Home => {
            if !service.home_collection {
                return Err(PortalError::InvalidSlotRequest {
                    reason: "home collection not offered for this service".into(),
                });
            }
            Ok(service.price + HOME_COLLECTION_SURCHARGE)
        }
    }
}
