//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use cartwheel_core::{Email, UserId};

/// A registered shop user.
///
/// Not serializable: the password hash never leaves the server.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    pub firstname: String,
    /// Unique email; the authentication principal.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A validated user ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub firstname: String,
    pub email: Email,
    pub password_hash: String,
}
