//! Room entity model.

use bookings_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `rooms` table. Reference data seeded by migration.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    pub room_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
