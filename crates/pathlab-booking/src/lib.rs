//! PathLab Booking — slot scheduling and appointment lifecycle.
//!
//! The slot grid is derived from a service's operating hours; slots
//! consumed by live reservations (and, for the current day, slots
//! whose start time has passed) are filtered out before offering.
//! Reservation itself is delegated to the repository layer, which
//! guarantees that concurrent requests for the same slot have exactly
//! one winner.

pub mod grid;
pub mod pricing;
pub mod scheduler;

pub use pricing::HOME_COLLECTION_SURCHARGE;
pub use scheduler::{BookingRequest, SlotScheduler};
