//! Room restriction entity model and DTOs.
//!
//! A restriction blocks a room over the half-open interval
//! `[start_date, end_date)`.

use bookings_core::dates::DateRange;
use bookings_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// `restrictions.id` for a block created by a reservation.
pub const RESTRICTION_RESERVATION: i16 = 1;
/// `restrictions.id` for a block placed by the owner.
pub const RESTRICTION_OWNER_BLOCK: i16 = 2;

/// A row from the `room_restrictions` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct RoomRestriction {
    pub id: DbId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub room_id: DbId,
    pub reservation_id: Option<DbId>,
    pub restriction_id: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a room restriction.
#[derive(Debug, Clone)]
pub struct CreateRoomRestriction {
    pub room_id: DbId,
    pub dates: DateRange,
    pub reservation_id: Option<DbId>,
    pub restriction_id: i16,
}

impl CreateRoomRestriction {
    /// The block created alongside a persisted reservation.
    pub fn for_reservation(reservation_id: DbId, room_id: DbId, dates: DateRange) -> Self {
        Self {
            room_id,
            dates,
            reservation_id: Some(reservation_id),
            restriction_id: RESTRICTION_RESERVATION,
        }
    }

    /// An owner block with no reservation behind it.
    pub fn owner_block(room_id: DbId, dates: DateRange) -> Self {
        Self {
            room_id,
            dates,
            reservation_id: None,
            restriction_id: RESTRICTION_OWNER_BLOCK,
        }
    }
}
