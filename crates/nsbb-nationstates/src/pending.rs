//! Hand-off of verified nations from form validation to the
//! registration-completed event.
//!
//! Validation and the completion event are separate host callbacks, so the
//! hand-off lives in a shared map keyed by username. Each entry also carries
//! the [`SubmissionId`] of the form that recorded it, so two registrations
//! racing for one username never consume or discard each other's entry. An
//! entry holding `None` means verification could not be performed and the
//! user is registered without a nation.

use nsbb_plugin::SubmissionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct Entry {
    submission: SubmissionId,
    nation: Option<String>,
}

type Table = HashMap<String, Vec<Entry>>;

/// Shared username to pending nation map. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct PendingAssignments {
    inner: Arc<Mutex<Table>>,
}

impl PendingAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records the outcome for `username` from `submission`. A repeated
    /// validation of the same submission replaces its earlier outcome.
    pub fn record(&self, username: &str, submission: SubmissionId, nation: Option<String>) {
        let mut table = self.lock();
        let entries = table.entry(username.to_string()).or_default();
        match entries.iter_mut().find(|e| e.submission == submission) {
            Some(entry) => {
                tracing::debug!(username, %submission, "replaced pending nation assignment");
                entry.nation = nation;
            }
            None => entries.push(Entry { submission, nation }),
        }
    }

    /// Removes and returns the entry `submission` recorded for `username`.
    pub fn take(&self, username: &str, submission: SubmissionId) -> Option<Option<String>> {
        let mut table = self.lock();
        let entries = table.get_mut(username)?;
        let index = entries.iter().position(|e| e.submission == submission)?;
        let entry = entries.swap_remove(index);
        if entries.is_empty() {
            table.remove(username);
        }
        Some(entry.nation)
    }

    /// Drops the entry `submission` recorded for `username`. Entries of other
    /// submissions are kept. Returns whether one existed.
    pub fn discard(&self, username: &str, submission: SubmissionId) -> bool {
        self.take(username, submission).is_some()
    }

    pub fn get(&self, username: &str, submission: SubmissionId) -> Option<Option<String>> {
        self.lock()
            .get(username)?
            .iter()
            .find(|e| e.submission == submission)
            .map(|e| e.nation.clone())
    }

    /// Number of entries across all usernames.
    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
