//! Repository for the `rooms` table and the availability searches over it.

use bookings_core::dates::DateRange;
use bookings_core::types::DbId;
use sqlx::PgPool;

use crate::models::room::Room;
use crate::repositories::RoomRestrictionRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "r.id, r.room_name, r.created_at, r.updated_at";

/// Half-open overlap between `rr` and the query range `[$1, $2)`.
///
/// Empty ranges overlap nothing, on either side.
pub(crate) const OVERLAPS: &str =
    "rr.start_date < $2 AND rr.end_date > $1 AND $1 < $2 AND rr.start_date < rr.end_date";

/// Read access to rooms.
pub struct RoomRepo;

impl RoomRepo {
    /// Find a room by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms r WHERE r.id = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every room, ordered by id.
    pub async fn list(pool: &PgPool) -> Result<Vec<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms r ORDER BY r.id");
        sqlx::query_as::<_, Room>(&query).fetch_all(pool).await
    }

    /// Rooms with no restriction overlapping `dates`, ordered by id.
    pub async fn find_available(pool: &PgPool, dates: DateRange) -> Result<Vec<Room>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rooms r \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM room_restrictions rr \
                 WHERE rr.room_id = r.id AND {OVERLAPS} \
             ) \
             ORDER BY r.id"
        );
        sqlx::query_as::<_, Room>(&query)
            .bind(dates.start())
            .bind(dates.end())
            .fetch_all(pool)
            .await
    }

    /// Whether no restriction on `room_id` overlaps `dates`.
    pub async fn is_available(
        pool: &PgPool,
        room_id: DbId,
        dates: DateRange,
    ) -> Result<bool, sqlx::Error> {
        let count = RoomRestrictionRepo::count_overlapping(pool, room_id, dates).await?;
        Ok(count == 0)
    }
}
