pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{availability, pages, reservation};
use crate::state::AppState;

/// Build the site route tree.
///
/// ```text
/// /                                   home
/// /about                              about
/// /contact                            contact
/// /generals-quarters                  room page
/// /majors-suite                       room page
///
/// /search-availability                search form (GET), search (POST)
/// /search-availability-json           single-room search, JSON (POST)
///
/// /choose-room/{id}                   pick a room from search results
/// /book-room?id=&s=&e=                book a room from its page
/// /make-reservation                   contact form (GET), submit (POST)
/// /reservation-summary                summary, clears the draft
/// ```
pub fn site_routes() -> Router<AppState> {
    Router::new()
        // Static pages.
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/contact", get(pages::contact))
        .route("/generals-quarters", get(pages::generals_quarters))
        .route("/majors-suite", get(pages::majors_suite))
        // Availability.
        .route(
            "/search-availability",
            get(availability::search_page).post(availability::search),
        )
        .route("/search-availability-json", post(availability::search_json))
        // Booking workflow.
        .route("/choose-room/{id}", get(reservation::choose_room))
        .route("/book-room", get(reservation::book_room))
        .route(
            "/make-reservation",
            get(reservation::reservation_form).post(reservation::make_reservation),
        )
        .route("/reservation-summary", get(reservation::reservation_summary))
}
