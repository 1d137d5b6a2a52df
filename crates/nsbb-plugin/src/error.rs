use thiserror::Error;

/// Errors returned from plugin hooks.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A hook failed for a plugin-specific reason.
    #[error("plugin '{plugin}' hook failed: {message}")]
    Hook {
        /// Name of the failing plugin.
        plugin: &'static str,
        /// What went wrong.
        message: String,
    },

    /// A user query failed.
    #[error(transparent)]
    User(#[from] nsbb_db::UserError),

    /// Any other SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
