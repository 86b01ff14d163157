//! Integration tests for the PostgreSQL booking store.
//!
//! Exercises availability searches, the booking transaction and the overlap
//! exclusion constraint against a real database.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use bookings_core::dates::DateRange;
use bookings_core::forms::ReservationForm;
use bookings_core::types::DbId;
use bookings_db::models::reservation::CreateReservation;
use bookings_db::models::room_restriction::{CreateRoomRestriction, RESTRICTION_RESERVATION};
use bookings_db::models::user::{CreateUser, UpdateUser, DEFAULT_ACCESS_LEVEL};
use bookings_db::repositories::{RoomRestrictionRepo, UserRepo};
use bookings_db::{BookingStore, PgStore, StoreError};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn store(pool: PgPool) -> PgStore {
    PgStore::new(pool, Duration::from_secs(3))
}

fn dates(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end).unwrap()
}

fn contact() -> ReservationForm {
    ReservationForm {
        first_name: "Ann".into(),
        last_name: "Smith".into(),
        email: "ann@x.com".into(),
        phone: "555-0100".into(),
    }
}

fn new_reservation(room_id: DbId, range: DateRange) -> CreateReservation {
    CreateReservation::new(room_id, range, &contact())
}

async fn available_ids(store: &PgStore, range: DateRange) -> Vec<DbId> {
    store
        .search_availability_by_dates(range)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect()
}

// ---------------------------------------------------------------------------
// Test: availability scenario from an empty restriction table
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_booking_removes_room_from_identical_search(pool: PgPool) {
    let store = store(pool);
    let range = dates("2050-01-01", "2050-01-02");

    assert_eq!(available_ids(&store, range).await, vec![1, 2]);

    store.book(&new_reservation(1, range)).await.unwrap();

    assert_eq!(available_ids(&store, range).await, vec![2]);
}

// ---------------------------------------------------------------------------
// Test: disjoint ranges do not affect each other
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_disjoint_ranges_are_independent(pool: PgPool) {
    let store = store(pool);
    store
        .book(&new_reservation(1, dates("2050-02-01", "2050-02-05")))
        .await
        .unwrap();

    // Ends exactly where the booking starts, and starts exactly where it ends.
    for (start, end) in [("2050-01-25", "2050-02-01"), ("2050-02-05", "2050-02-09")] {
        let range = dates(start, end);
        assert!(store
            .search_availability_by_dates_for_room(range, 1)
            .await
            .unwrap());
        assert_eq!(available_ids(&store, range).await, vec![1, 2]);
    }

    // Any overlap blocks the room.
    for (start, end) in [
        ("2050-01-30", "2050-02-02"),
        ("2050-02-04", "2050-02-06"),
        ("2050-02-02", "2050-02-03"),
        ("2050-01-01", "2050-03-01"),
    ] {
        let range = dates(start, end);
        assert!(!store
            .search_availability_by_dates_for_room(range, 1)
            .await
            .unwrap());
        assert_eq!(available_ids(&store, range).await, vec![2]);
    }
}

// ---------------------------------------------------------------------------
// Test: per-room check agrees with the set search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_room_check_is_specialization_of_search(pool: PgPool) {
    let store = store(pool);
    store
        .book(&new_reservation(1, dates("2050-04-10", "2050-04-15")))
        .await
        .unwrap();
    store
        .insert_room_restriction(&CreateRoomRestriction::owner_block(
            2,
            dates("2050-04-01", "2050-04-11"),
        ))
        .await
        .unwrap();

    let ranges = [
        dates("2050-04-01", "2050-04-05"),
        dates("2050-04-09", "2050-04-12"),
        dates("2050-04-11", "2050-04-20"),
        dates("2050-04-15", "2050-04-16"),
        dates("2050-04-12", "2050-04-12"),
    ];
    for range in ranges {
        let free = available_ids(&store, range).await;
        for room_id in [1, 2] {
            let single = store
                .search_availability_by_dates_for_room(range, room_id)
                .await
                .unwrap();
            assert_eq!(
                free.contains(&room_id),
                single,
                "room {room_id} over {range:?}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Test: a zero-length range is always available
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_range_overlaps_nothing(pool: PgPool) {
    let store = store(pool);
    store
        .book(&new_reservation(1, dates("2050-05-01", "2050-05-10")))
        .await
        .unwrap();

    let inside = dates("2050-05-05", "2050-05-05");
    assert_eq!(available_ids(&store, inside).await, vec![1, 2]);
    assert!(store
        .search_availability_by_dates_for_room(inside, 1)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_restriction_blocks_nothing(pool: PgPool) {
    let store = store(pool);
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
    assert_eq!(available_ids(&store, around).await, vec![1, 2]);

    // Booking across the empty block goes through too.
    store.book(&new_reservation(1, around)).await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: reservation round trip
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reservation_round_trip(pool: PgPool) {
    let store = store(pool);
    let range = dates("2050-07-01", "2050-07-03");
    let input = new_reservation(2, range);

    let booked = store.book(&input).await.unwrap();
    let read = store.get_reservation(booked.reservation.id).await.unwrap();

    assert_eq!(read.first_name, input.first_name);
    assert_eq!(read.last_name, input.last_name);
    assert_eq!(read.email, input.email);
    assert_eq!(read.phone, input.phone);
    assert_eq!(read.room_id, 2);
    assert_eq!(read.dates().unwrap(), range);

    assert_eq!(booked.restriction.reservation_id, Some(read.id));
    assert_eq!(booked.restriction.restriction_id, RESTRICTION_RESERVATION);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bare_reservation_does_not_block_room(pool: PgPool) {
    let store = store(pool);
    let range = dates("2050-08-01", "2050-08-04");

    let id = store.insert_reservation(&new_reservation(1, range)).await.unwrap();
    assert_eq!(store.get_reservation(id).await.unwrap().room_id, 1);

    // Only restriction rows count against availability.
    assert!(store.search_availability_by_dates_for_room(range, 1).await.unwrap());

    let names: Vec<String> = store
        .list_rooms()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.room_name)
        .collect();
    assert_eq!(names, vec!["General's Quarters", "Major's Suite"]);
}

// ---------------------------------------------------------------------------
// Test: not-found is distinct from transport failures
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_room_not_found(pool: PgPool) {
    let store = store(pool);
    let room = store.get_room(1).await.unwrap();
    assert_eq!(room.room_name, "General's Quarters");

    assert_matches!(
        store.get_room(999).await,
        Err(StoreError::NotFound { entity: "Room", id: 999 })
    );
    assert_matches!(
        store.get_reservation(999).await,
        Err(StoreError::NotFound { entity: "Reservation", id: 999 })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_closed_pool_is_a_transport_error(pool: PgPool) {
    let store = store(pool.clone());
    pool.close().await;

    let err = store.get_room(1).await.unwrap_err();
    assert!(err.is_transport(), "expected transport error, got {err:?}");
}

// ---------------------------------------------------------------------------
// Test: failed bookings persist nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rejected_booking_leaves_no_orphans(pool: PgPool) {
    let store = store(pool.clone());
    let range = dates("2050-08-01", "2050-08-05");
    store.book(&new_reservation(1, range)).await.unwrap();

    assert_matches!(
        store
            .book(&new_reservation(1, dates("2050-08-04", "2050-08-06")))
            .await,
        Err(StoreError::Conflict(_))
    );
    assert_matches!(
        store.book(&new_reservation(77, range)).await,
        Err(StoreError::NotFound { entity: "Room", id: 77 })
    );

    let (reservations,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reservations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(reservations, 1);

    let restrictions = RoomRestrictionRepo::list_for_room(&pool, 1).await.unwrap();
    assert_eq!(restrictions.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: the exclusion constraint rejects overlapping restrictions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_overlapping_restriction_insert_is_conflict(pool: PgPool) {
    let store = store(pool);
    store
        .insert_room_restriction(&CreateRoomRestriction::owner_block(
            2,
            dates("2050-09-01", "2050-09-10"),
        ))
        .await
        .unwrap();

    assert_matches!(
        store
            .insert_room_restriction(&CreateRoomRestriction::owner_block(
                2,
                dates("2050-09-09", "2050-09-12"),
            ))
            .await,
        Err(StoreError::Conflict(_))
    );

    // Adjacent blocks are fine.
    store
        .insert_room_restriction(&CreateRoomRestriction::owner_block(
            2,
            dates("2050-09-10", "2050-09-12"),
        ))
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Test: concurrent double booking admits exactly one
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_double_booking_admits_exactly_one(pool: PgPool) {
    let store = Arc::new(store(pool.clone()));
    let range = dates("2050-10-01", "2050-10-03");

    let attempts = (0..2).map(|_| {
        let store = Arc::clone(&store);
        async move { store.book(&new_reservation(1, range)).await }
    });
    let results = futures::future::join_all(attempts).await;

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::Conflict(_))))
        .count();
    assert_eq!(ok, 1, "results: {results:?}");
    assert_eq!(conflicts, 1, "results: {results:?}");

    let restrictions = RoomRestrictionRepo::list_for_room(&pool, 1).await.unwrap();
    assert_eq!(restrictions.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_disjoint_bookings_both_succeed(pool: PgPool) {
    let store = Arc::new(store(pool.clone()));

    for month in 1..=6 {
        let early = dates(&format!("2051-{month:02}-01"), &format!("2051-{month:02}-03"));
        let late = dates(&format!("2051-{month:02}-10"), &format!("2051-{month:02}-12"));

        let attempts = [early, late].map(|range| {
            let store = Arc::clone(&store);
            async move { store.book(&new_reservation(1, range)).await }
        });
        let results = futures::future::join_all(attempts).await;

        assert!(results.iter().all(|r| r.is_ok()), "month {month}: {results:?}");
    }

    let restrictions = RoomRestrictionRepo::list_for_room(&pool, 1).await.unwrap();
    assert_eq!(restrictions.len(), 12);
}

// ---------------------------------------------------------------------------
// Test: users listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_users(pool: PgPool) {
    let input = CreateUser::new("Ann", "Smith", "ann@x.com", "owner-secret").unwrap();
    UserRepo::create(&pool, &input).await.unwrap();

    let users = store(pool).all_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "ann@x.com");
    assert_eq!(users[0].access_level, DEFAULT_ACCESS_LEVEL);
}

// ---------------------------------------------------------------------------
// Test: user lookup, update and authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_authenticate_user(pool: PgPool) {
    let input = CreateUser::new("Ann", "Smith", "ann@x.com", "owner-secret").unwrap();
    let user = UserRepo::create(&pool, &input).await.unwrap();
    let store = store(pool.clone());

    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(stored.starts_with("$argon2id$"));

    assert_eq!(
        store.authenticate("ann@x.com", "owner-secret").await.unwrap(),
        Some(user.id)
    );
    assert_eq!(store.authenticate("ann@x.com", "guess").await.unwrap(), None);
    assert_eq!(store.authenticate("nobody@x.com", "owner-secret").await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unreadable_password_hash_never_matches(pool: PgPool) {
    sqlx::query(
        "INSERT INTO users (first_name, last_name, email, password) \
         VALUES ('Ann', 'Smith', 'ann@x.com', 'not-a-real-hash')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let store = store(pool);
    assert_eq!(store.authenticate("ann@x.com", "not-a-real-hash").await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_and_update_user(pool: PgPool) {
    let ann = UserRepo::create(
        &pool,
        &CreateUser::new("Ann", "Smith", "ann@x.com", "owner-secret").unwrap(),
    )
    .await
    .unwrap();
    UserRepo::create(
        &pool,
        &CreateUser::new("Bob", "Jones", "bob@x.com", "other-secret").unwrap(),
    )
    .await
    .unwrap();
    let store = store(pool);

    assert_eq!(store.get_user_by_id(ann.id).await.unwrap(), ann);
    assert_matches!(
        store.get_user_by_id(999).await,
        Err(StoreError::NotFound { entity: "User", id: 999 })
    );

    let taken = UpdateUser {
        first_name: "Annie".into(),
        last_name: "Smith".into(),
        email: "bob@x.com".into(),
        access_level: 3,
    };
    assert_matches!(
        store.update_user(ann.id, &taken).await,
        Err(StoreError::Conflict(_))
    );

    let update = UpdateUser {
        email: "annie@x.com".into(),
        ..taken
    };
    let updated = store.update_user(ann.id, &update).await.unwrap();
    assert_eq!(updated.first_name, "Annie");
    assert_eq!(updated.email, "annie@x.com");
    assert_eq!(updated.access_level, 3);

    // The password survives a profile update.
    assert_eq!(
        store.authenticate("annie@x.com", "owner-secret").await.unwrap(),
        Some(ann.id)
    );
    assert_matches!(
        store.update_user(999, &update).await,
        Err(StoreError::NotFound { entity: "User", id: 999 })
    );
}
