//! Post records.

use nsbb_types::Post;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Errors produced by post queries.
#[derive(Debug, Error)]
pub enum PostError {
    /// No post with the given ID exists.
    #[error("post not found: {0}")]
    NotFound(i64),

    /// Any other SQLite failure, including a dangling author ID.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Stores a post for an existing user.
pub fn create_post(conn: &Connection, user_id: i64, content: &str) -> Result<Post, PostError> {
    conn.execute(
        "INSERT INTO posts (user_id, content) VALUES (?1, ?2)",
        params![user_id, content],
    )?;
    get_post(conn, conn.last_insert_rowid())
}

/// Loads a post by ID.
pub fn get_post(conn: &Connection, id: i64) -> Result<Post, PostError> {
    conn.query_row(
        "SELECT id, user_id, content, created_at FROM posts WHERE id = ?1",
        params![id],
        |row| {
            Ok(Post {
                id: row.get(0)?,
                user_id: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or(PostError::NotFound(id))
}
