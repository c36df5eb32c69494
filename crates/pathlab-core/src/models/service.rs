//! Diagnostic service domain model.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PortalError, PortalResult};

/// Per-service booking hours. The slot grid is derived from these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperatingHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    /// Slot length in minutes; every slot in the grid has this length.
    pub slot_minutes: u32,
    /// Optional midday gap during which no slots are offered.
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    /// Weekly closing day; booking requests for this day are rejected.
    pub day_off: Weekday,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            close: NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
            slot_minutes: 30,
            break_start: NaiveTime::from_hms_opt(13, 0, 0),
            break_end: NaiveTime::from_hms_opt(14, 0, 0),
            day_off: Weekday::Sun,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    /// Unique display name, e.g. "Complete Blood Count".
    pub name: String,
    /// Price in whole currency units.
    pub price: i64,
    pub duration_minutes: u32,
    pub department: String,
    /// Whether a home sample collection can be booked for this service.
    pub home_collection: bool,
    pub active: bool,
    pub hours: OperatingHours,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateService {
    pub name: String,
    pub price: i64,
    pub duration_minutes: u32,
    pub department: String,
    pub home_collection: bool,
    /// Defaults to portal-wide hours when omitted.
    pub hours: Option<OperatingHours>,
}

impl CreateService {
    pub fn validate(&self) -> PortalResult<()> {
        if self.name.trim().is_empty() {
            return Err(PortalError::Validation {
                message: "service name must not be empty".into(),
            });
        }
        if self.price < 0 {
            return Err(PortalError::Validation {
                message: "service price must be non-negative".into(),
            });
        }
        if self.duration_minutes == 0 {
            return Err(PortalError::Validation {
                message: "service duration must be positive".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateService {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub duration_minutes: Option<u32>,
    pub department: Option<String>,
    pub home_collection: Option<bool>,
    pub active: Option<bool>,
    pub hours: Option<OperatingHours>,
}

impl UpdateService {
    pub fn validate(&self) -> PortalResult<()> {
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(PortalError::Validation {
                message: "service name must not be empty".into(),
            });
        }
        if matches!(self.price, Some(p) if p < 0) {
            return Err(PortalError::Validation {
                message: "service price must be non-negative".into(),
            });
        }
        if self.duration_minutes == Some(0) {
            return Err(PortalError::Validation {
                message: "service duration must be positive".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CreateService {
        CreateService {
            name: "Complete Blood Count".into(),
            price: 500,
            duration_minutes: 30,
            department: "Hematology".into(),
            home_collection: true,
            hours: None,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut i = input();
        i.price = -1;
        assert!(matches!(i.validate(), Err(PortalError::Validation { .. })));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut i = input();
        i.duration_minutes = 0;
        assert!(matches!(i.validate(), Err(PortalError::Validation { .. })));
    }
}
