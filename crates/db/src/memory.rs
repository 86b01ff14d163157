//! In-process [`BookingStore`] with the same semantics as [`crate::PgStore`].
//!
//! Used by handler tests and for running the site without a database. All
//! state sits behind one mutex, so `book` checks and inserts atomically.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bookings_core::dates::DateRange;
use bookings_core::types::{DbId, Timestamp};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::models::reservation::{Booking, CreateReservation, Reservation};
use crate::models::room::Room;
use crate::models::room_restriction::{CreateRoomRestriction, RoomRestriction};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::store::{password_matches, BookingStore};

/// A user row together with its password hash.
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Tables {
    rooms: Vec<Room>,
    reservations: Vec<Reservation>,
    restrictions: Vec<RoomRestriction>,
    users: Vec<StoredUser>,
    last_id: DbId,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn room(&self, id: DbId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    fn email_taken(&self, email: &str, except: Option<DbId>) -> bool {
        self.users
            .iter()
            .any(|u| u.user.email == email && Some(u.user.id) != except)
    }

    fn is_free(&self, room_id: DbId, dates: DateRange) -> bool {
        !self
            .restrictions
            .iter()
            .filter(|rr| rr.room_id == room_id)
            .any(|rr| {
                DateRange::new(rr.start_date, rr.end_date).is_ok_and(|r| r.overlaps(&dates))
            })
    }

    fn insert_reservation(
        &mut self,
        input: &CreateReservation,
        now: Timestamp,
    ) -> StoreResult<Reservation> {
        if self.room(input.room_id).is_none() {
            return Err(StoreError::Conflict(format!(
                "referenced row does not exist (room {})",
                input.room_id
            )));
        }
        let reservation = Reservation {
            id: self.next_id(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            start_date: input.dates.start(),
            end_date: input.dates.end(),
            room_id: input.room_id,
            created_at: now,
            updated_at: now,
        };
        self.reservations.push(reservation.clone());
        Ok(reservation)
    }

    fn insert_restriction(
        &mut self,
        input: &CreateRoomRestriction,
        now: Timestamp,
    ) -> StoreResult<RoomRestriction> {
        if self.room(input.room_id).is_none() {
            return Err(StoreError::Conflict(format!(
                "referenced row does not exist (room {})",
                input.room_id
            )));
        }
        if !self.is_free(input.room_id, input.dates) {
            return Err(StoreError::Conflict(
                "room is not available for these dates".into(),
            ));
        }
        let restriction = RoomRestriction {
            id: self.next_id(),
            start_date: input.dates.start(),
            end_date: input.dates.end(),
            room_id: input.room_id,
            reservation_id: input.reservation_id,
            restriction_id: input.restriction_id,
            created_at: now,
            updated_at: now,
        };
        self.restrictions.push(restriction.clone());
        Ok(restriction)
    }
}

/// Mutex-guarded tables plus a switch simulating a lost connection.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl MemoryStore {
    /// An empty store with no rooms.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the same two rooms the migrations seed.
    pub fn seeded() -> Self {
        Self::with_rooms(&["General's Quarters", "Major's Suite"])
    }

    /// A store holding one room per name, with ids starting at 1.
    pub fn with_rooms(names: &[&str]) -> Self {
        let now = Utc::now();
        let mut tables = Tables::default();
        for name in names {
            let id = tables.next_id();
            tables.rooms.push(Room {
                id,
                room_name: (*name).to_string(),
                created_at: now,
                updated_at: now,
            });
        }
        Self {
            tables: Mutex::new(tables),
            offline: AtomicBool::new(false),
        }
    }

    /// Add a user row. Emails are unique, as in `uq_users_email`.
    pub async fn add_user(&self, input: &CreateUser) -> StoreResult<User> {
        self.ensure_online()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        if tables.email_taken(&input.email, None) {
            return Err(StoreError::Conflict("duplicate value (uq_users_email)".into()));
        }
        let user = User {
            id: tables.next_id(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            access_level: input.access_level,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(StoredUser {
            user: user.clone(),
            password_hash: input.password_hash.clone(),
        });
        Ok(user)
    }

    /// While offline, every call fails with a database error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Snapshot of every stored restriction.
    pub async fn restrictions(&self) -> Vec<RoomRestriction> {
        self.tables.lock().await.restrictions.clone()
    }

    /// Snapshot of every stored reservation.
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.tables.lock().await.reservations.clone()
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        self.ensure_online()
    }

    async fn all_users(&self) -> StoreResult<Vec<User>> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().map(|u| u.user.clone()).collect())
    }

    async fn get_user_by_id(&self, id: DbId) -> StoreResult<User> {
        self.ensure_online()?;
        self.tables
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone())
            .ok_or(StoreError::NotFound { entity: "User", id })
    }

    async fn update_user(&self, id: DbId, input: &UpdateUser) -> StoreResult<User> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        if tables.email_taken(&input.email, Some(id)) {
            return Err(StoreError::Conflict("duplicate value (uq_users_email)".into()));
        }
        let stored = tables
            .users
            .iter_mut()
            .find(|u| u.user.id == id)
            .ok_or(StoreError::NotFound { entity: "User", id })?;
        stored.user.first_name = input.first_name.clone();
        stored.user.last_name = input.last_name.clone();
        stored.user.email = input.email.clone();
        stored.user.access_level = input.access_level;
        stored.user.updated_at = Utc::now();
        Ok(stored.user.clone())
    }

    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<Option<DbId>> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.user.email == email)
            .filter(|u| password_matches(u.user.id, password, &u.password_hash))
            .map(|u| u.user.id))
    }

    async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        self.ensure_online()?;
        Ok(self.tables.lock().await.rooms.clone())
    }

    async fn get_room(&self, id: DbId) -> StoreResult<Room> {
        self.ensure_online()?;
        self.tables
            .lock()
            .await
            .room(id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "Room", id })
    }

    async fn insert_reservation(&self, input: &CreateReservation) -> StoreResult<DbId> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        Ok(tables.insert_reservation(input, Utc::now())?.id)
    }

    async fn insert_room_restriction(&self, input: &CreateRoomRestriction) -> StoreResult<DbId> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        Ok(tables.insert_restriction(input, Utc::now())?.id)
    }

    async fn book(&self, input: &CreateReservation) -> StoreResult<Booking> {
        self.ensure_online()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().await;

        if tables.room(input.room_id).is_none() {
            return Err(StoreError::NotFound {
                entity: "Room",
                id: input.room_id,
            });
        }
        if !tables.is_free(input.room_id, input.dates) {
            return Err(StoreError::Conflict(
                "room is not available for these dates".into(),
            ));
        }

        let reservation = tables.insert_reservation(input, now)?;
        let restriction = tables.insert_restriction(
            &CreateRoomRestriction::for_reservation(reservation.id, input.room_id, input.dates),
            now,
        )?;
        Ok(Booking {
            reservation,
            restriction,
        })
    }

    async fn get_reservation(&self, id: DbId) -> StoreResult<Reservation> {
        self.ensure_online()?;
        self.tables
            .lock()
            .await
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "Reservation",
                id,
            })
    }

    async fn search_availability_by_dates(&self, dates: DateRange) -> StoreResult<Vec<Room>> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        let mut rooms: Vec<Room> = tables
            .rooms
            .iter()
            .filter(|room| tables.is_free(room.id, dates))
            .cloned()
            .collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn search_availability_by_dates_for_room(
        &self,
        dates: DateRange,
        room_id: DbId,
    ) -> StoreResult<bool> {
        self.ensure_online()?;
        Ok(self.tables.lock().await.is_free(room_id, dates))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use bookings_core::forms::ReservationForm;

    use super::*;

    fn dates(start: &str, end: &str) -> DateRange {
        DateRange::parse(start, end).unwrap()
    }

    fn booking(room_id: DbId, range: DateRange) -> CreateReservation {
        let contact = ReservationForm {
            first_name: "Ann".into(),
            last_name: "Smith".into(),
            email: "ann@x.com".into(),
            phone: "555-0100".into(),
        };
        CreateReservation::new(room_id, range, &contact)
    }

    #[tokio::test]
    async fn empty_store_lists_every_room_as_free() {
        let store = MemoryStore::seeded();
        let rooms = store
            .search_availability_by_dates(dates("2050-01-01", "2050-01-02"))
            .await
            .unwrap();
        let ids: Vec<DbId> = rooms.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn booked_room_drops_out_of_the_same_search() {
        let store = MemoryStore::seeded();
        let range = dates("2050-01-01", "2050-01-02");
        store.book(&booking(1, range)).await.unwrap();

        let rooms = store.search_availability_by_dates(range).await.unwrap();
        let ids: Vec<DbId> = rooms.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);
        assert!(!store
            .search_availability_by_dates_for_room(range, 1)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn get_room_distinguishes_missing_from_offline() {
        let store = MemoryStore::seeded();
        assert_matches!(
            store.get_room(99).await,
            Err(StoreError::NotFound { entity: "Room", id: 99 })
        );
        store.set_offline(true);
        let err = store.get_room(1).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn book_links_restriction_to_reservation() {
        let store = MemoryStore::seeded();
        let range = dates("2050-03-01", "2050-03-04");
        let booked = store.book(&booking(2, range)).await.unwrap();

        assert_eq!(booked.restriction.reservation_id, Some(booked.reservation.id));
        assert_eq!(booked.restriction.room_id, 2);
        assert_eq!(store.reservations().await.len(), 1);
        assert_eq!(store.restrictions().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_book_leaves_no_rows() {
        let store = MemoryStore::seeded();
        let range = dates("2050-03-01", "2050-03-04");
        store.book(&booking(1, range)).await.unwrap();

        let overlapping = dates("2050-03-03", "2050-03-05");
        assert_matches!(
            store.book(&booking(1, overlapping)).await,
            Err(StoreError::Conflict(_))
        );
        assert_matches!(
            store.book(&booking(42, range)).await,
            Err(StoreError::NotFound { entity: "Room", .. })
        );
        assert_eq!(store.reservations().await.len(), 1);
        assert_eq!(store.restrictions().await.len(), 1);
    }

    #[tokio::test]
    async fn empty_restriction_blocks_nothing() {
        let store = MemoryStore::seeded();
        store
            .insert_room_restriction(&CreateRoomRestriction::owner_block(
                1,
                dates("2050-05-05", "2050-05-05"),
            ))
            .await
            .unwrap();

        let around = dates("2050-05-01", "2050-05-10");
        assert!(store
            .search_availability_by_dates_for_room(around, 1)
            .await
            .unwrap());
        store.book(&booking(1, around)).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_double_booking_admits_exactly_one() {
        let store = Arc::new(MemoryStore::seeded());
        let range = dates("2050-06-10", "2050-06-12");

        let a = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.book(&booking(1, range)).await }
        });
        let b = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.book(&booking(1, range)).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(StoreError::Conflict(_))))
                .count(),
            1
        );
        assert_eq!(store.restrictions().await.len(), 1);
    }

    fn owner(email: &str) -> CreateUser {
        CreateUser::new("Ann", "Smith", email, "owner-secret").unwrap()
    }

    #[tokio::test]
    async fn users_are_listed() {
        let store = MemoryStore::seeded();
        assert!(store.all_users().await.unwrap().is_empty());
        store.add_user(&owner("ann@x.com")).await.unwrap();
        let users = store.all_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "ann@x.com");
    }

    #[tokio::test]
    async fn authenticate_checks_email_and_password() {
        let store = MemoryStore::seeded();
        let user = store.add_user(&owner("ann@x.com")).await.unwrap();

        assert_eq!(
            store.authenticate("ann@x.com", "owner-secret").await.unwrap(),
            Some(user.id)
        );
        assert_eq!(store.authenticate("ann@x.com", "wrong").await.unwrap(), None);
        assert_eq!(store.authenticate("bob@x.com", "owner-secret").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_user_keeps_emails_unique() {
        let store = MemoryStore::seeded();
        let ann = store.add_user(&owner("ann@x.com")).await.unwrap();
        store.add_user(&owner("bob@x.com")).await.unwrap();

        let update = UpdateUser {
            first_name: "Annie".into(),
            last_name: "Smith".into(),
            email: "bob@x.com".into(),
            access_level: 3,
        };
        assert_matches!(
            store.update_user(ann.id, &update).await,
            Err(StoreError::Conflict(_))
        );

        let update = UpdateUser {
            email: "annie@x.com".into(),
            ..update
        };
        let updated = store.update_user(ann.id, &update).await.unwrap();
        assert_eq!(updated.first_name, "Annie");
        assert_eq!(updated.access_level, 3);
        assert_eq!(store.get_user_by_id(ann.id).await.unwrap(), updated);

        assert_matches!(
            store.get_user_by_id(999).await,
            Err(StoreError::NotFound { entity: "User", id: 999 })
        );
    }
}
