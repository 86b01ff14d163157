//! The store capability set used by the web layer.
//!
//! [`BookingStore`] is implemented by [`PgStore`] (PostgreSQL) and by
//! [`crate::memory::MemoryStore`] (in-process fake). The binary picks one at
//! startup and shares it as `Arc<dyn BookingStore>`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bookings_core::dates::DateRange;
use bookings_core::password::verify_password;
use bookings_core::types::DbId;

use crate::error::{StoreError, StoreResult};
use crate::models::reservation::{Booking, CreateReservation, Reservation};
use crate::models::room::Room;
use crate::models::room_restriction::CreateRoomRestriction;
use crate::models::user::{UpdateUser, User};
use crate::repositories::{ReservationRepo, RoomRepo, RoomRestrictionRepo, UserRepo};
use crate::DbPool;

/// Default per-call deadline.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(3);

/// Rooms, restrictions and reservations, one round trip per call.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Whether the backing store is reachable.
    async fn health_check(&self) -> StoreResult<()>;

    async fn all_users(&self) -> StoreResult<Vec<User>>;

    /// Fetch one user; a missing id is [`StoreError::NotFound`].
    async fn get_user_by_id(&self, id: DbId) -> StoreResult<User>;

    /// Replace a user's profile fields. A taken email is a
    /// [`StoreError::Conflict`].
    async fn update_user(&self, id: DbId, input: &UpdateUser) -> StoreResult<User>;

    /// The id of the user with this email and password, or `None` when either
    /// does not match.
    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<Option<DbId>>;

    async fn list_rooms(&self) -> StoreResult<Vec<Room>>;

    /// Fetch one room; a missing id is [`StoreError::NotFound`].
    async fn get_room(&self, id: DbId) -> StoreResult<Room>;

    /// Insert a reservation row on its own, returning its id.
    async fn insert_reservation(&self, input: &CreateReservation) -> StoreResult<DbId>;

    /// Insert a restriction row on its own, returning its id.
    async fn insert_room_restriction(&self, input: &CreateRoomRestriction) -> StoreResult<DbId>;

    /// Insert a reservation and its restriction as one unit.
    ///
    /// Fails with [`StoreError::Conflict`] when the room is already taken for
    /// any part of the range, and with [`StoreError::NotFound`] for an unknown
    /// room. On failure nothing is persisted.
    async fn book(&self, input: &CreateReservation) -> StoreResult<Booking>;

    async fn get_reservation(&self, id: DbId) -> StoreResult<Reservation>;

    /// Rooms with no restriction overlapping `dates`, ordered by id.
    async fn search_availability_by_dates(&self, dates: DateRange) -> StoreResult<Vec<Room>>;

    /// Whether `room_id` has no restriction overlapping `dates`.
    async fn search_availability_by_dates_for_room(
        &self,
        dates: DateRange,
        room_id: DbId,
    ) -> StoreResult<bool>;
}

/// PostgreSQL-backed store. Every call is bounded by `call_timeout`.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
    call_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: DbPool, call_timeout: Duration) -> Self {
        Self { pool, call_timeout }
    }

    /// Run one store call under the deadline. No retry on expiry.
    async fn bounded<T, E, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, E>> + Send,
        E: Into<StoreError>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                tracing::warn!(timeout = ?self.call_timeout, "Store call timed out");
                Err(StoreError::Timeout(self.call_timeout))
            }
        }
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        self.bounded(crate::health_check(&self.pool)).await
    }

    async fn all_users(&self) -> StoreResult<Vec<User>> {
        self.bounded(UserRepo::list(&self.pool)).await
    }

    async fn get_user_by_id(&self, id: DbId) -> StoreResult<User> {
        self.bounded(UserRepo::find_by_id(&self.pool, id))
            .await?
            .ok_or(StoreError::NotFound { entity: "User", id })
    }

    async fn update_user(&self, id: DbId, input: &UpdateUser) -> StoreResult<User> {
        let call = async {
            UserRepo::update(&self.pool, id, input)
                .await
                .map_err(StoreError::classify)
        };
        self.bounded(call)
            .await?
            .ok_or(StoreError::NotFound { entity: "User", id })
    }

    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<Option<DbId>> {
        let credentials = self
            .bounded(UserRepo::find_credentials(&self.pool, email))
            .await?;
        Ok(credentials.and_then(|(id, hash)| password_matches(id, password, &hash).then_some(id)))
    }

    async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        self.bounded(RoomRepo::list(&self.pool)).await
    }

    async fn get_room(&self, id: DbId) -> StoreResult<Room> {
        self.bounded(RoomRepo::find_by_id(&self.pool, id))
            .await?
            .ok_or(StoreError::NotFound { entity: "Room", id })
    }

    async fn insert_reservation(&self, input: &CreateReservation) -> StoreResult<DbId> {
        let call = async {
            ReservationRepo::create(&self.pool, input)
                .await
                .map(|r| r.id)
                .map_err(StoreError::classify)
        };
        self.bounded(call).await
    }

    async fn insert_room_restriction(&self, input: &CreateRoomRestriction) -> StoreResult<DbId> {
        let call = async {
            RoomRestrictionRepo::create(&self.pool, input)
                .await
                .map(|r| r.id)
                .map_err(StoreError::classify)
        };
        self.bounded(call).await
    }

    async fn book(&self, input: &CreateReservation) -> StoreResult<Booking> {
        self.bounded(ReservationRepo::book(&self.pool, input)).await
    }

    async fn get_reservation(&self, id: DbId) -> StoreResult<Reservation> {
        self.bounded(ReservationRepo::find_by_id(&self.pool, id))
            .await?
            .ok_or(StoreError::NotFound {
                entity: "Reservation",
                id,
            })
    }

    async fn search_availability_by_dates(&self, dates: DateRange) -> StoreResult<Vec<Room>> {
        self.bounded(RoomRepo::find_available(&self.pool, dates)).await
    }

    async fn search_availability_by_dates_for_room(
        &self,
        dates: DateRange,
        room_id: DbId,
    ) -> StoreResult<bool> {
        self.bounded(RoomRepo::is_available(&self.pool, room_id, dates)).await
    }
}

/// Compare a login attempt with a stored hash. An unreadable hash never
/// matches.
pub(crate) fn password_matches(user_id: DbId, password: &str, hash: &str) -> bool {
    verify_password(password, hash).unwrap_or_else(|err| {
        tracing::warn!(user_id, error = %err, "Stored password hash is unreadable");
        false
    })
}
