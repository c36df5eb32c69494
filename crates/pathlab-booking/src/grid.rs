//! Slot grid derivation from operating hours.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::service::OperatingHours;

/// All slot start times a service offers on a working day.
///
/// Slots step from `open` in `slot_minutes` increments; a slot is
/// offered only if it ends by `close` and does not start inside the
/// break window.
pub fn slot_grid(hours: &OperatingHours) -> Vec<NaiveTime> {
    let step = Duration::minutes(i64::from(hours.slot_minutes));
    let mut slots = Vec::new();
    let mut current = hours.open;

    loop {
        let end = current + step;
        if end > hours.close || end < current {
            break;
        }
        let in_break = match (hours.break_start, hours.break_end) {
            (Some(start), Some(stop)) => current >= start && current < stop,
            _ => false,
        };
        if !in_break {
            slots.push(current);
        }
        current = end;
    }

    slots
}

/// Reject booking dates in the past or on the weekly closing day.
pub fn validate_booking_date(
    hours: &OperatingHours,
    date: NaiveDate,
    today: NaiveDate,
) -> PortalResult<()> {
    if date < today {
        return Err(PortalError::InvalidSlotRequest {
            reason: "date is in the past".into(),
        });
    }
    if date.weekday() == hours.day_off {
        return Err(PortalError::InvalidSlotRequest {
            reason: format!("closed on {}", hours.day_off),
        });
    }
    Ok(())
}

/// Drop slots that have already started. Only applies when the
/// requested date is the current day.
pub fn filter_elapsed(
    slots: Vec<NaiveTime>,
    date: NaiveDate,
    today: NaiveDate,
    now: NaiveTime,
) -> Vec<NaiveTime> {
    if date != today {
        return slots;
    }
    slots.into_iter().filter(|slot| *slot > now).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn hours() -> OperatingHours {
        OperatingHours::default()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn default_hours_grid_skips_the_break() {
        let grid = slot_grid(&hours());
        // 09:00-17:00 at 30 minutes is 16 slots, minus two in the
        // 13:00-14:00 break.
        assert_eq!(grid.len(), 14);
        assert_eq!(grid.first(), Some(&t(9, 0)));
        assert_eq!(grid.last(), Some(&t(16, 30)));
        assert!(!grid.contains(&t(13, 0)));
        assert!(!grid.contains(&t(13, 30)));
        assert!(grid.contains(&t(14, 0)));
    }

    #[test]
    fn last_slot_must_end_by_close() {
        let mut h = hours();
        h.close = t(16, 45);
        let grid = slot_grid(&h);
        // A 16:30 slot would end at 17:00, past the 16:45 close.
        assert_eq!(grid.last(), Some(&t(16, 0)));
    }

    #[test]
    fn no_break_means_continuous_grid() {
        let mut h = hours();
        h.break_start = None;
        h.break_end = None;
        let grid = slot_grid(&h);
        assert_eq!(grid.len(), 16);
        assert!(grid.contains(&t(13, 0)));
    }

    #[test]
    fn past_dates_are_rejected() {
        // 2026-09-07 is a Monday.
        let result = validate_booking_date(&hours(), d(2026, 9, 6), d(2026, 9, 7));
        assert!(matches!(
            result,
            Err(PortalError::InvalidSlotRequest { .. })
        ));
    }

    #[test]
    fn day_off_is_rejected() {
        // 2026-09-13 is a Sunday, the default closing day.
        assert_eq!(d(2026, 9, 13).weekday(), Weekday::Sun);
        let result = validate_booking_date(&hours(), d(2026, 9, 13), d(2026, 9, 7));
        assert!(matches!(
            result,
            Err(PortalError::InvalidSlotRequest { .. })
        ));
    }

    #[test]
    fn today_is_bookable() {
        let today = d(2026, 9, 7);
        assert!(validate_booking_date(&hours(), today, today).is_ok());
    }

    #[test]
    fn elapsed_slots_are_dropped_only_for_today() {
        let slots = vec![t(9, 0), t(10, 0), t(11, 0)];
        let today = d(2026, 9, 7);

        let same_day = filter_elapsed(slots.clone(), today, today, t(10, 0));
        assert_eq!(same_day, vec![t(11, 0)]);

        let future = filter_elapsed(slots.clone(), d(2026, 9, 8), today, t(10, 0));
        assert_eq!(future, slots);
    }
}
