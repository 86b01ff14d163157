//! Handlers for the static pages.

use axum::extract::State;
use axum::response::{Html, Response};

use crate::pages::{self, GENERALS_QUARTERS, MAJORS_SUITE};
use crate::session::Session;
use crate::state::AppState;

/// GET /
pub async fn home(State(state): State<AppState>, mut session: Session) -> Response {
    let flash = session.take_flash();
    session.respond(&state.config.session, Html(pages::home(flash.as_ref())))
}

/// GET /about
pub async fn about(State(state): State<AppState>, mut session: Session) -> Response {
    let flash = session.take_flash();
    session.respond(&state.config.session, Html(pages::about(flash.as_ref())))
}

/// GET /contact
pub async fn contact(State(state): State<AppState>, mut session: Session) -> Response {
    let flash = session.take_flash();
    session.respond(&state.config.session, Html(pages::contact(flash.as_ref())))
}

/// GET /generals-quarters
pub async fn generals_quarters(State(state): State<AppState>, mut session: Session) -> Response {
    let flash = session.take_flash();
    let html = pages::room(&GENERALS_QUARTERS, flash.as_ref());
    session.respond(&state.config.session, Html(html))
}

/// GET /majors-suite
pub async fn majors_suite(State(state): State<AppState>, mut session: Session) -> Response {
    let flash = session.take_flash();
    let html = pages::room(&MAJORS_SUITE, flash.as_ref());
    session.respond(&state.config.session, Html(html))
}
