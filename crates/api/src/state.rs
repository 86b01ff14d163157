use std::sync::Arc;

use bookings_db::BookingStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Room, restriction and reservation store, chosen at startup.
    pub store: Arc<dyn BookingStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
