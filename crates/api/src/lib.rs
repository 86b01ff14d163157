//! Bookings web server library.
//!
//! Exposes config, state, error handling, the session cookie, page rendering
//! and routes so integration tests and the binary entrypoint can both use
//! them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod router;
pub mod routes;
pub mod session;
pub mod state;
