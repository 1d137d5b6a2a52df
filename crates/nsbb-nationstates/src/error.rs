use crate::PLUGIN_NAME;
use nsbb_db::UserError;
use nsbb_plugin::PluginError;
use thiserror::Error;

/// Errors from the registration binder and nation storage.
#[derive(Debug, Error)]
pub enum NationStatesError {
    /// The registration-completed event fired for a username that never
    /// went through nation validation in this process.
    #[error("no pending nation assignment for user '{0}'")]
    NoPendingEntry(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    User(#[from] UserError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl From<NationStatesError> for PluginError {
    fn from(err: NationStatesError) -> Self {
        match err {
            NationStatesError::User(e) => PluginError::User(e),
            NationStatesError::Database(e) => PluginError::Database(e),
            other => PluginError::Hook {
                plugin: PLUGIN_NAME,
                message: other.to_string(),
            },
        }
    }
}
