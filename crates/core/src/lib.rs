//! Domain layer for the bookings application.
//!
//! Pure types and logic with no database or HTTP dependencies: date ranges,
//! contact-form validation, password hashing and the reservation draft
//! workflow.

pub mod dates;
pub mod error;
pub mod forms;
pub mod password;
pub mod types;
pub mod workflow;
