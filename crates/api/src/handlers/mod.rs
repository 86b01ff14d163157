pub mod availability;
pub mod pages;
pub mod reservation;

use axum::response::Response;
use bookings_core::error::CoreError;
use bookings_db::StoreError;

use crate::session::Session;
use crate::state::AppState;

/// Flash shown when a form body cannot be decoded at all.
pub(crate) const UNREADABLE_FORM: &str = "the submitted form could not be read";

/// Log a failed store call and send the user to `to` with a generic message.
pub(crate) fn store_failure(
    state: &AppState,
    session: Session,
    err: StoreError,
    message: &str,
    to: &str,
) -> Response {
    tracing::error!(error = %err, "Store call failed");
    session.fail(&state.config.session, message, to)
}

/// The user-facing text of a domain error.
pub(crate) fn flash_message(err: &CoreError) -> String {
    match err {
        CoreError::Validation(msg) | CoreError::Conflict(msg) => msg.clone(),
        CoreError::NotFound { entity, .. } => format!("{entity} does not exist"),
        CoreError::Internal(_) => "Something went wrong, please try again".to_string(),
    }
}
