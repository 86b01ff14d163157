//! User entity model. The password hash is never selected with it.

use bookings_core::error::CoreError;
use bookings_core::password::hash_password;
use bookings_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Access level given to users created without one.
pub const DEFAULT_ACCESS_LEVEL: i32 = 1;

/// A row from the `users` table, without the `password` column.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub access_level: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a user. Holds the hash, never the plaintext.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub access_level: i32,
}

impl CreateUser {
    /// Build a user with the default access level, hashing `password`.
    pub fn new(
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_string(),
            password_hash: hash_password(password)?,
            access_level: DEFAULT_ACCESS_LEVEL,
        })
    }
}

/// DTO for updating a user's profile. The password is not changed here.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub access_level: i32,
}
