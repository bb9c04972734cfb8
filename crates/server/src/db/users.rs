//! User queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use cartwheel_core::{Email, UserId};

use super::{RepositoryError, map_constraint};
use crate::models::{NewUser, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    firstname: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            username: row.username,
            firstname: row.firstname,
            email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn username_exists(
    conn: &mut PgConnection,
    username: &str,
) -> Result<bool, RepositoryError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(conn)
            .await?;
    Ok(exists)
}

pub async fn email_exists(conn: &mut PgConnection, email: &Email) -> Result<bool, RepositoryError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email.as_str())
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

/// Insert a user.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the username or email already exists.
pub async fn insert(conn: &mut PgConnection, user: &NewUser) -> Result<User, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        INSERT INTO users (username, firstname, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, firstname, email, password_hash, created_at, updated_at
        ",
    )
    .bind(&user.username)
    .bind(&user.firstname)
    .bind(user.email.as_str())
    .bind(&user.password_hash)
    .fetch_one(conn)
    .await
    .map_err(map_constraint)?;

    row.try_into()
}

/// Get a user by their email address.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
pub async fn get_by_email(
    conn: &mut PgConnection,
    email: &Email,
) -> Result<Option<User>, RepositoryError> {
    sqlx::query_as::<_, UserRow>(
        r"
        SELECT id, username, firstname, email, password_hash, created_at, updated_at
        FROM users
        WHERE email = $1
        ",
    )
    .bind(email.as_str())
    .fetch_optional(conn)
    .await?
    .map(User::try_from)
    .transpose()
}
