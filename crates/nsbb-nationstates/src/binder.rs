//! Moves the pending nation onto the user once registration completed.

use crate::error::NationStatesError;
use crate::pending::PendingAssignments;
use crate::store;
use nsbb_plugin::SubmissionId;
use rusqlite::Connection;

/// Consumes the entry `submission` left for `username` and stores it on the
/// user.
///
/// A missing entry means the completion event fired without this process
/// having validated the form; that is reported as
/// [`NationStatesError::NoPendingEntry`] and not papered over.
pub fn bind_pending_nation(
    conn: &Connection,
    pending: &PendingAssignments,
    username: &str,
    submission: SubmissionId,
) -> Result<Option<String>, NationStatesError> {
    let user = nsbb_db::get_user_by_username(conn, username)?
        .ok_or_else(|| NationStatesError::UserNotFound(username.to_string()))?;
    let nation = pending
        .take(username, submission)
        .ok_or_else(|| NationStatesError::NoPendingEntry(username.to_string()))?;

    store::set_user_nation(conn, user.id, nation.as_deref())?;
    tracing::info!(
        user_id = user.id,
        nation = nation.as_deref().unwrap_or("<none>"),
        "assigned user nation"
    );

    Ok(nation)
}
