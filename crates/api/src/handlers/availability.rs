//! Handlers for date searches.
//!
//! The HTML search records the dates on the draft and lists the free rooms.
//! The JSON search checks a single room; every answer, failures included,
//! carries `ok` and `message`.

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use bookings_core::dates::{format_date, DateRange};
use bookings_core::types::DbId;
use bookings_core::workflow::ReservationDraft;
use serde::{Deserialize, Serialize};

use super::{flash_message, store_failure, UNREADABLE_FORM};
use crate::error::{AppError, AppResult};
use crate::pages;
use crate::session::Session;
use crate::state::AppState;

/// Search form fields (`YYYY-MM-DD`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub start: String,
    pub end: String,
}

/// Single-room search fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RoomSearchForm {
    pub start: String,
    pub end: String,
    pub room_id: String,
}

/// JSON answer for a single-room search.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub ok: bool,
    pub message: String,
    pub room_id: DbId,
    pub start_date: String,
    pub end_date: String,
}

/// JSON answer for a single-room search that could not be carried out.
#[derive(Debug, Serialize)]
pub struct AvailabilityFailure {
    pub ok: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /search-availability
pub async fn search_page(State(state): State<AppState>, mut session: Session) -> Response {
    let flash = session.take_flash();
    let html = pages::search_availability(flash.as_ref());
    session.respond(&state.config.session, Html(html))
}

/// POST /search-availability
///
/// Records the dates on the draft, keeping its room only if that room is
/// among the free ones, and lists the free rooms.
pub async fn search(
    State(state): State<AppState>,
    mut session: Session,
    form: Result<Form<SearchForm>, FormRejection>,
) -> Response {
    let config = &state.config.session;

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(%rejection, "Search form body unreadable");
            return session.fail(config, UNREADABLE_FORM, "/search-availability");
        }
    };

    let dates = match DateRange::parse(&form.start, &form.end) {
        Ok(dates) => dates,
        Err(err) => return session.fail(config, flash_message(&err), "/search-availability"),
    };

    let rooms = match state.store.search_availability_by_dates(dates).await {
        Ok(rooms) => rooms,
        Err(err) => {
            return store_failure(&state, session, err, "could not search for availability", "/")
        }
    };

    if rooms.is_empty() {
        return session.fail(
            config,
            "No rooms available for these dates",
            "/search-availability",
        );
    }

    let draft = ReservationDraft::choose_dates(session.take_draft(), dates, |room_id| {
        rooms.iter().any(|r| r.id == room_id)
    });
    tracing::debug!(
        start = %dates.start(),
        end = %dates.end(),
        free = rooms.len(),
        "Availability searched",
    );

    let flash = session.take_flash();
    let html = pages::choose_room(&rooms, dates, &draft, flash.as_ref());
    session.set_draft(draft);
    session.respond(config, Html(html))
}

/// POST /search-availability-json
///
/// Checks one room for the given dates. Failures keep their status code
/// (400, 404, 500, 503) and answer `{ok: false, message}`.
pub async fn search_json(
    State(state): State<AppState>,
    form: Result<Form<RoomSearchForm>, FormRejection>,
) -> Response {
    match check_room(&state, form).await {
        Ok(answer) => Json(answer).into_response(),
        Err(err) => {
            let (status, _, message) = err.classify();
            let body = AvailabilityFailure { ok: false, message };
            (status, Json(body)).into_response()
        }
    }
}

async fn check_room(
    state: &AppState,
    form: Result<Form<RoomSearchForm>, FormRejection>,
) -> AppResult<AvailabilityResponse> {
    let Form(form) = form.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let room_id: DbId = form
        .room_id
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("room_id must be supplied".into()))?;
    let dates = DateRange::parse(&form.start, &form.end)?;

    state.store.get_room(room_id).await?;
    let ok = state
        .store
        .search_availability_by_dates_for_room(dates, room_id)
        .await?;

    let message = if ok {
        "Available"
    } else {
        "Not available for these dates"
    };

    Ok(AvailabilityResponse {
        ok,
        message: message.to_string(),
        room_id,
        start_date: format_date(dates.start()),
        end_date: format_date(dates.end()),
    })
}
