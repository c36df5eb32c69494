//! Appointment domain model.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Where the sample is collected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Lab,
    Home,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Lab => "lab",
            Location::Home => "home",
        }
    }
}

/// A booked appointment. Appointments are never physically deleted;
/// cancellation and completion are status transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub service_id: Uuid,
    /// Assigned staff member, if any.
    pub employee_id: Option<Uuid>,
    pub date: NaiveDate,
    /// Start of the reserved slot.
    pub slot: NaiveTime,
    pub location: Location,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    /// Final quoted price in whole currency units, surcharge included.
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointment {
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub date: NaiveDate,
    pub slot: NaiveTime,
    pub location: Location,
    pub amount: i64,
}
