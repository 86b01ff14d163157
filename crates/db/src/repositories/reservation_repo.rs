//! Repository for the `reservations` table and the booking transaction.

use bookings_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::error::{StoreError, StoreResult};
use crate::models::reservation::{Booking, CreateReservation, Reservation};
use crate::models::room_restriction::CreateRoomRestriction;
use crate::repositories::RoomRestrictionRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, first_name, last_name, email, phone, start_date, end_date, room_id, \
    created_at, updated_at";

/// Provides inserts and reads for reservations.
pub struct ReservationRepo;

impl ReservationRepo {
    /// Insert a new reservation, returning the created row.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateReservation,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "INSERT INTO reservations \
                (first_name, last_name, email, phone, start_date, end_date, room_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(input.dates.start())
            .bind(input.dates.end())
            .bind(input.room_id)
            .fetch_one(executor)
            .await
    }

    /// Find a reservation by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Persist a reservation and the restriction blocking its room, atomically.
    ///
    /// Runs at the default `READ COMMITTED` isolation. The availability check
    /// inside the transaction gives the usual answer; a concurrent booking that
    /// slips past it loses on `ex_room_restrictions_overlap`, reported as
    /// [`StoreError::Conflict`]. Bookings on disjoint ranges never block each
    /// other. Either insert failing rolls back both, so no reservation is left
    /// without its restriction.
    pub async fn book(pool: &PgPool, input: &CreateReservation) -> StoreResult<Booking> {
        let mut tx = pool.begin().await?;

        let room_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM rooms WHERE id = $1)")
                .bind(input.room_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(StoreError::classify)?;
        if !room_exists {
            return Err(StoreError::NotFound {
                entity: "Room",
                id: input.room_id,
            });
        }

        let overlapping =
            RoomRestrictionRepo::count_overlapping(&mut *tx, input.room_id, input.dates)
                .await
                .map_err(StoreError::classify)?;
        if overlapping > 0 {
            return Err(StoreError::Conflict(
                "room is not available for these dates".into(),
            ));
        }

        let reservation = Self::create(&mut *tx, input)
            .await
            .map_err(StoreError::classify)?;
        let restriction = RoomRestrictionRepo::create(
            &mut *tx,
            &CreateRoomRestriction::for_reservation(
                reservation.id,
                reservation.room_id,
                input.dates,
            ),
        )
        .await
        .map_err(StoreError::classify)?;

        tx.commit().await.map_err(StoreError::classify)?;

        tracing::debug!(
            reservation_id = reservation.id,
            restriction_id = restriction.id,
            room_id = reservation.room_id,
            "Reservation booked",
        );
        Ok(Booking {
            reservation,
            restriction,
        })
    }
}
