//! User records.

use nsbb_types::User;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use thiserror::Error;

/// Errors produced by user queries.
#[derive(Debug, Error)]
pub enum UserError {
    /// The username is already registered.
    #[error("username already taken: {0}")]
    Duplicate(String),

    /// No user with the given username or ID exists.
    #[error("user not found: {0}")]
    NotFound(String),

    /// Any other SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// Inserts a new user.
///
/// # Errors
///
/// Returns [`UserError::Duplicate`] if the username exists already.
pub fn create_user(conn: &Connection, username: &str) -> Result<User, UserError> {
    match conn.execute("INSERT INTO users (username) VALUES (?1)", [username]) {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            return Err(UserError::Duplicate(username.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    get_user(conn, conn.last_insert_rowid())
}

/// Loads a user by row ID.
///
/// # Errors
///
/// Returns [`UserError::NotFound`] if no such user exists.
pub fn get_user(conn: &Connection, id: i64) -> Result<User, UserError> {
    conn.query_row(
        "SELECT id, username, created_at FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    )
    .optional()?
    .ok_or_else(|| UserError::NotFound(id.to_string()))
}

/// Loads a user by username. Returns `Ok(None)` if nobody has that name.
pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, UserError> {
    let user = conn
        .query_row(
            "SELECT id, username, created_at FROM users WHERE username = ?1",
            [username],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}
