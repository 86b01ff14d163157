//! Handlers for the booking workflow: choosing a room, the contact form and
//! the summary.
//!
//! The draft lives in the session cookie. User-input and domain failures
//! become an error flash plus a redirect; store failures are logged first.

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Response};
use axum::Form;
use bookings_core::dates::DateRange;
use bookings_core::forms::{FormErrors, ReservationForm};
use bookings_core::types::DbId;
use bookings_core::workflow::{ReservationDraft, Stage};
use bookings_db::models::reservation::CreateReservation;
use bookings_db::StoreError;
use serde::Deserialize;

use super::{flash_message, store_failure, UNREADABLE_FORM};
use crate::pages;
use crate::session::{FlashKind, Session};
use crate::state::AppState;

/// Query string of the room pages' booking form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BookRoomQuery {
    pub id: String,
    /// Arrival date (`YYYY-MM-DD`).
    pub s: String,
    /// Departure date (`YYYY-MM-DD`).
    pub e: String,
}

// ---------------------------------------------------------------------------
// Choosing a room
// ---------------------------------------------------------------------------

/// GET /choose-room/{id}
///
/// Puts the room on the draft. With dates already chosen the user goes on to
/// the contact form, otherwise to the date search.
pub async fn choose_room(
    State(state): State<AppState>,
    mut session: Session,
    Path(id): Path<String>,
) -> Response {
    let config = &state.config.session;

    let Ok(room_id) = id.trim().parse::<DbId>() else {
        return session.fail(config, "room number is invalid", "/");
    };

    let room = match state.store.get_room(room_id).await {
        Ok(room) => room,
        Err(StoreError::NotFound { .. }) => {
            let html = pages::not_found("That room does not exist.");
            return session.respond(config, (StatusCode::NOT_FOUND, Html(html)));
        }
        Err(err) => {
            return store_failure(&state, session, err, "could not fetch room for this ID", "/")
        }
    };

    let pending_dates = session
        .draft()
        .filter(|d| d.stage() != Stage::Persisted)
        .and_then(|d| d.dates);
    if let Some(dates) = pending_dates {
        match state
            .store
            .search_availability_by_dates_for_room(dates, room.id)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                let message = format!("{} is not available for these dates", room.room_name);
                return session.fail(config, message, "/search-availability");
            }
            Err(err) => {
                return store_failure(&state, session, err, "could not check availability", "/")
            }
        }
    }

    let draft = ReservationDraft::choose_room(session.take_draft(), room.id, room.room_name);
    let next = if draft.stage() == Stage::ContactPending {
        "/make-reservation"
    } else {
        session.flash(FlashKind::Info, "Choose the dates for your stay");
        "/search-availability"
    };
    session.set_draft(draft);
    session.redirect(config, next)
}

/// GET /book-room?id=&s=&e=
///
/// Books a specific room for the dates picked on its page, replacing any
/// earlier draft.
pub async fn book_room(
    State(state): State<AppState>,
    mut session: Session,
    Query(query): Query<BookRoomQuery>,
) -> Response {
    let config = &state.config.session;

    let Ok(room_id) = query.id.trim().parse::<DbId>() else {
        return session.fail(config, "room number is invalid", "/");
    };
    let dates = match DateRange::parse(&query.s, &query.e) {
        Ok(dates) => dates,
        Err(err) => return session.fail(config, flash_message(&err), "/"),
    };

    let room = match state.store.get_room(room_id).await {
        Ok(room) => room,
        Err(StoreError::NotFound { .. }) => {
            return session.fail(config, "requested room does not exist", "/")
        }
        Err(err) => {
            return store_failure(&state, session, err, "could not fetch room for this ID", "/")
        }
    };

    match state
        .store
        .search_availability_by_dates_for_room(dates, room.id)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            let message = format!("{} is not available for these dates", room.room_name);
            return session.fail(config, message, "/search-availability");
        }
        Err(err) => {
            return store_failure(&state, session, err, "could not check availability", "/")
        }
    }

    let chosen = ReservationDraft::choose_room(session.take_draft(), room.id, room.room_name);
    let draft = ReservationDraft::choose_dates(Some(chosen), dates, |_| true);
    session.set_draft(draft);
    session.redirect(config, "/make-reservation")
}

// ---------------------------------------------------------------------------
// Contact form
// ---------------------------------------------------------------------------

/// GET /make-reservation
pub async fn reservation_form(State(state): State<AppState>, mut session: Session) -> Response {
    let config = &state.config.session;

    let draft = session.draft().cloned().unwrap_or_default();
    if let Err(err) = draft.booking_target() {
        return session.fail(config, flash_message(&err), "/");
    }

    let flash = session.take_flash();
    let html = pages::make_reservation(&draft, &draft.contact, &FormErrors::default(), flash.as_ref());
    session.respond(config, Html(html))
}

/// POST /make-reservation
///
/// Invalid contact fields re-render the form with status 422. A valid form
/// books the room; the persisted draft is kept for the summary page.
pub async fn make_reservation(
    State(state): State<AppState>,
    mut session: Session,
    form: Result<Form<ReservationForm>, FormRejection>,
) -> Response {
    let config = &state.config.session;

    let draft = session.draft().cloned().unwrap_or_default();
    let (room_id, dates) = match draft.booking_target() {
        Ok(target) => target,
        Err(err) => return session.fail(config, flash_message(&err), "/"),
    };

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(%rejection, "Contact form body unreadable");
            return session.fail(config, UNREADABLE_FORM, "/make-reservation");
        }
    };

    if let Err(errors) = form.check() {
        tracing::debug!(fields = ?errors.fields().collect::<Vec<_>>(), "Contact form rejected");
        let flash = session.take_flash();
        let html = pages::make_reservation(&draft, &form, &errors, flash.as_ref());
        session.set_draft(draft.with_contact(form));
        return session.respond(config, (StatusCode::UNPROCESSABLE_ENTITY, Html(html)));
    }

    let input = CreateReservation::new(room_id, dates, &form);
    match state.store.book(&input).await {
        Ok(booking) => {
            tracing::info!(
                reservation_id = booking.reservation.id,
                room_id,
                start = %dates.start(),
                end = %dates.end(),
                "Reservation made",
            );
            session.set_draft(draft.with_contact(form).persisted(booking.reservation.id));
            session.redirect(config, "/reservation-summary")
        }
        Err(StoreError::Conflict(reason)) => {
            tracing::info!(room_id, %reason, "Booking rejected");
            // Keep the dates and contact, drop the room that was taken.
            let draft = ReservationDraft::choose_dates(Some(draft.with_contact(form)), dates, |_| false);
            session.set_draft(draft);
            session.fail(
                config,
                "Sorry, that room is no longer available for these dates",
                "/search-availability",
            )
        }
        Err(StoreError::NotFound { .. }) => {
            session.take_draft();
            session.fail(config, "requested room does not exist", "/")
        }
        Err(err) => store_failure(&state, session, err, "could not create reservation", "/"),
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// GET /reservation-summary
///
/// Shows the persisted reservation once and clears the draft.
pub async fn reservation_summary(State(state): State<AppState>, mut session: Session) -> Response {
    let config = &state.config.session;

    match session.take_draft() {
        Some(draft) if draft.stage() == Stage::Persisted => {
            let flash = session.take_flash();
            let html = pages::reservation_summary(&draft, flash.as_ref());
            session.respond(config, Html(html))
        }
        other => {
            if let Some(draft) = other {
                session.set_draft(draft);
            }
            session.fail(config, "there is no reservation to summarize", "/")
        }
    }
}
