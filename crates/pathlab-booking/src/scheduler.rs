//! Slot scheduler — availability, reservation and lifecycle.

use chrono::{NaiveDate, NaiveTime, Utc};
use pathlab_auth::gate;
use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::appointment::{
    Appointment, AppointmentStatus, CreateAppointment, Location,
};
use pathlab_core::models::audit::{AuditAction, AuditEvent, EntityType};
use pathlab_core::models::permission::{Permission, Role};
use pathlab_core::models::session::Session;
use pathlab_core::repository::{AppointmentRepository, ServiceRepository};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::grid;
use crate::pricing;

/// A reservation request as it arrives from the API layer.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub slot: NaiveTime,
    pub location: Location,
    /// Patient being booked for; defaults to the session's actor.
    /// Booking on behalf of someone else is a staff capability.
    pub patient_id: Option<Uuid>,
}

/// Slot scheduler over the service and appointment repositories.
pub struct SlotScheduler<S: ServiceRepository, A: AppointmentRepository> {
    service_repo: S,
    appointment_repo: A,
}

impl<S: ServiceRepository, A: AppointmentRepository> SlotScheduler<S, A> {
    pub fn new(service_repo: S, appointment_repo: A) -> Self {
        Self {
            service_repo,
            appointment_repo,
        }
    }

    /// Free slots for a service on a date.
    ///
    /// The grid comes from the service's operating hours; slots held
    /// by live reservations are removed, and for the current day so
    /// are slots whose start time has passed.
    pub async fn list_available_slots(
        &self,
        service_id: Uuid,
        date: NaiveDate,
    ) -> PortalResult<Vec<NaiveTime>> {
        let service = self.service_repo.get_by_id(service_id).await?;
        if !service.active {
            return Err(PortalError::InvalidSlotRequest {
                reason: "service is not bookable".into(),
            });
        }

        let now = Utc::now().naive_utc();
        grid::validate_booking_date(&service.hours, date, now.date())?;

        let booked = self.appointment_repo.booked_slots(service_id, date).await?;
        let free = grid::slot_grid(&service.hours)
            .into_iter()
            .filter(|slot| !booked.contains(slot))
            .collect();

        Ok(grid::filter_elapsed(free, date, now.date(), now.time()))
    }

    /// Reserve a slot.
    ///
    /// The request is validated against the service's grid, priced,
    /// and handed to the repository whose transaction decides the
    /// winner under concurrency.
    pub async fn reserve_slot(
        &self,
        session: &Session,
        granted: &[Permission],
        request: BookingRequest,
    ) -> PortalResult<Appointment> {
        let patient_id = request.patient_id.unwrap_or(session.actor_id);
        if patient_id != session.actor_id {
            gate::require_permission(session, granted, Permission::EditAppointments)?;
        }

        let service = self.service_repo.get_by_id(request.service_id).await?;
        if !service.active {
            return Err(PortalError::InvalidSlotRequest {
                reason: "service is not bookable".into(),
            });
        }

        let now = Utc::now().naive_utc();
        grid::validate_booking_date(&service.hours, request.date, now.date())?;
        if !grid::slot_grid(&service.hours).contains(&request.slot) {
            return Err(PortalError::InvalidSlotRequest {
                reason: "slot is not on the service's grid".into(),
            });
        }
        if request.date == now.date() && request.slot <= now.time() {
            return Err(PortalError::InvalidSlotRequest {
                reason: "slot has already started".into(),
            });
        }

        let amount = pricing::quote(&service, request.location)?;

        let appointment = self
            .appointment_repo
            .reserve(
                CreateAppointment {
                    patient_id,
                    service_id: request.service_id,
                    employee_id: None,
                    date: request.date,
                    slot: request.slot,
                    location: request.location,
                    amount,
                },
                AuditEvent::new(session.actor_id, AuditAction::Book, EntityType::Appointment)
                    .details(json!({
                        "service_id": request.service_id,
                        "date": request.date.to_string(),
                        "slot": request.slot.format("%H:%M").to_string(),
                        "amount": amount,
                    })),
            )
            .await?;

        info!(
            appointment_id = %appointment.id,
            service_id = %request.service_id,
            "slot reserved"
        );

        Ok(appointment)
    }

    /// Cancel an appointment, freeing its slot.
    ///
    /// Allowed for the owning patient, staff holding
    /// `edit_appointments`, and admins.
    pub async fn cancel_appointment(
        &self,
        session: &Session,
        granted: &[Permission],
        appointment_id: Uuid,
    ) -> PortalResult<Appointment> {
        let appointment = self.appointment_repo.get_by_id(appointment_id).await?;

        let is_owner = session.role == Role::User && appointment.patient_id == session.actor_id;
        if !is_owner {
            gate::require_permission(session, granted, Permission::EditAppointments)?;
        }

        if appointment.status != AppointmentStatus::Scheduled {
            return Err(PortalError::Validation {
                message: format!(
                    "cannot cancel a {} appointment",
                    appointment.status.as_str()
                ),
            });
        }

        let cancelled = self
            .appointment_repo
            .set_status(
                appointment_id,
                AppointmentStatus::Cancelled,
                AuditEvent::new(
                    session.actor_id,
                    AuditAction::Cancel,
                    EntityType::Appointment,
                ),
            )
            .await?;

        info!(appointment_id = %appointment_id, "appointment cancelled");

        Ok(cancelled)
    }

    /// Mark an appointment completed. Staff capability; the slot hold
    /// is kept since the time was actually consumed.
    pub async fn complete_appointment(
        &self,
        session: &Session,
        granted: &[Permission],
        appointment_id: Uuid,
    ) -> PortalResult<Appointment> {
        gate::require_staff(session)?;
        gate::require_permission(session, granted, Permission::EditAppointments)?;

        let appointment = self.appointment_repo.get_by_id(appointment_id).await?;
        if appointment.status != AppointmentStatus::Scheduled {
            return Err(PortalError::Validation {
                message: format!(
                    "cannot complete a {} appointment",
                    appointment.status.as_str()
                ),
            });
        }

        self.appointment_repo
            .set_status(
                appointment_id,
                AppointmentStatus::Completed,
                AuditEvent::new(
                    session.actor_id,
                    AuditAction::Complete,
                    EntityType::Appointment,
                ),
            )
            .await
    }
}
