//! Reservation entity model and DTOs.

use bookings_core::dates::DateRange;
use bookings_core::error::CoreError;
use bookings_core::forms::ReservationForm;
use bookings_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use crate::models::room_restriction::RoomRestriction;

/// A row from the `reservations` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Reservation {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub room_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Reservation {
    pub fn dates(&self) -> Result<DateRange, CoreError> {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// DTO for inserting a reservation.
#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub room_id: DbId,
    pub dates: DateRange,
}

impl CreateReservation {
    pub fn new(room_id: DbId, dates: DateRange, contact: &ReservationForm) -> Self {
        Self {
            first_name: contact.first_name.trim().to_string(),
            last_name: contact.last_name.trim().to_string(),
            email: contact.email.trim().to_string(),
            phone: contact.phone.trim().to_string(),
            room_id,
            dates,
        }
    }
}

/// A reservation together with the restriction that blocks its room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub reservation: Reservation,
    pub restriction: RoomRestriction,
}
