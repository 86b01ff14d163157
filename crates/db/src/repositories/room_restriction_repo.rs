//! Repository for the `room_restrictions` table.

use bookings_core::dates::DateRange;
use bookings_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::room_restriction::{CreateRoomRestriction, RoomRestriction};
use crate::repositories::room_repo::OVERLAPS;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, start_date, end_date, room_id, reservation_id, restriction_id, \
    created_at, updated_at";

/// Inserts and reads date blocks on rooms.
pub struct RoomRestrictionRepo;

impl RoomRestrictionRepo {
    /// Insert a new restriction, returning the created row.
    ///
    /// An overlap with an existing restriction on the same room violates
    /// `ex_room_restrictions_overlap`.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateRoomRestriction,
    ) -> Result<RoomRestriction, sqlx::Error> {
        let query = format!(
            "INSERT INTO room_restrictions \
                (start_date, end_date, room_id, reservation_id, restriction_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RoomRestriction>(&query)
            .bind(input.dates.start())
            .bind(input.dates.end())
            .bind(input.room_id)
            .bind(input.reservation_id)
            .bind(input.restriction_id)
            .fetch_one(executor)
            .await
    }

    /// Count restrictions on `room_id` overlapping `dates`.
    pub async fn count_overlapping<'e, E: PgExecutor<'e>>(
        executor: E,
        room_id: DbId,
        dates: DateRange,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM room_restrictions rr \
             WHERE rr.room_id = $3 AND {OVERLAPS}"
        );
        sqlx::query_scalar::<_, i64>(&query)
            .bind(dates.start())
            .bind(dates.end())
            .bind(room_id)
            .fetch_one(executor)
            .await
    }

    /// List restrictions on a room, ordered by start date.
    pub async fn list_for_room(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<RoomRestriction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM room_restrictions WHERE room_id = $1 ORDER BY start_date"
        );
        sqlx::query_as::<_, RoomRestriction>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }
}
