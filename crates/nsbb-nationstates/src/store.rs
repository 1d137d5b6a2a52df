//! The `users.nation` column added by this plugin.

use crate::error::NationStatesError;
use rusqlite::{params, Connection, OptionalExtension};

/// Sets (or clears) the nation of a user.
pub fn set_user_nation(
    conn: &Connection,
    user_id: i64,
    nation: Option<&str>,
) -> Result<(), NationStatesError> {
    let updated = conn.execute(
        "UPDATE users SET nation = ?1 WHERE id = ?2",
        params![nation, user_id],
    )?;
    if updated == 0 {
        return Err(NationStatesError::UserNotFound(user_id.to_string()));
    }
    Ok(())
}

/// The nation linked to a user, if any.
pub fn user_nation(conn: &Connection, user_id: i64) -> Result<Option<String>, NationStatesError> {
    conn.query_row(
        "SELECT nation FROM users WHERE id = ?1",
        params![user_id],
        |row| row.get::<_, Option<String>>(0),
    )
    .optional()?
    .ok_or_else(|| NationStatesError::UserNotFound(user_id.to_string()))
}
