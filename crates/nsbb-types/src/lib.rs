//! Shared records for the nsbb forum.
//!
//! Every crate in the workspace talks about users and posts through the
//! types defined here. Plugin-specific columns (such as a user's linked
//! nation) are owned by the plugin that adds them and are not part of these
//! records.

use serde::{Deserialize, Serialize};

/// A registered forum user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Database row ID.
    pub id: i64,
    /// Unique username, immutable after creation.
    pub username: String,
    /// Creation timestamp as stored by SQLite (`datetime('now')`).
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// A forum post in its stored (unrendered) form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Database row ID.
    pub id: i64,
    /// ID of the authoring user.
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Raw markup as submitted.
    pub content: String,
    /// Creation timestamp as stored by SQLite.
    #[serde(rename = "createdAt")]
    pub created_at: String,
}
