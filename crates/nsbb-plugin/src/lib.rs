//! Plugin contract between the nsbb host and its extensions.
//!
//! A plugin implements [`ForumPlugin`]; every hook has a no-op default so a
//! plugin only overrides what it needs. The host keeps plugins in a
//! [`PluginRegistry`] and calls hooks through it, in registration order.
//!
//! Hook points:
//!
//! | Hook                          | When the host calls it                         |
//! |-------------------------------|------------------------------------------------|
//! | `migrations`                  | startup, after core migrations                 |
//! | `extend_registration_form`    | building the registration form                 |
//! | `registration_form_fragment`  | rendering the registration form                |
//! | `on_user_registered`          | after the new user row is committed            |
//! | `on_registration_rejected`    | a submitted registration did not go through    |
//! | `post_author_info`            | rendering a post's author block                |
//! | `block_rules` / `render_strategies` | building the post renderer               |

mod error;
pub mod form;
mod registry;

pub use error::PluginError;
pub use form::{FormField, RegistrationForm, SubmissionId};
pub use registry::PluginRegistry;

use nsbb_db::Migration;
use nsbb_markup::{BlockRule, RenderStrategy};
use nsbb_types::{Post, User};
use rusqlite::Connection;
use std::sync::Arc;

/// A forum extension.
///
/// Hooks taking a [`Connection`] are called from a blocking thread and may
/// run SQL directly.
pub trait ForumPlugin: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    /// Embedded migrations, run after the core set. Names must be unique
    /// across all plugins.
    fn migrations(&self) -> &'static [Migration] {
        &[]
    }

    /// Appends fields (with their validators) to the registration form.
    fn extend_registration_form(&self, _form: &mut RegistrationForm) {}

    /// HTML for the fields this plugin added, placed before the submit button.
    fn registration_form_fragment(&self, _form: &RegistrationForm) -> Option<String> {
        None
    }

    /// The user `username` has been committed from the form `submission`.
    fn on_user_registered(
        &self,
        _conn: &Connection,
        _username: &str,
        _submission: SubmissionId,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    /// The form `submission` for `username` failed validation or could not
    /// be committed.
    fn on_registration_rejected(&self, _username: &str, _submission: SubmissionId) {}

    /// Extra HTML shown next to the author of `post`.
    fn post_author_info(
        &self,
        _conn: &Connection,
        _user: &User,
        _post: &Post,
    ) -> Result<Option<String>, PluginError> {
        Ok(None)
    }

    /// Block rules, tried at each line start before markdown.
    fn block_rules(&self) -> Vec<Arc<dyn BlockRule>> {
        Vec::new()
    }

    /// Render strategies, consulted in order.
    fn render_strategies(&self) -> Vec<Arc<dyn RenderStrategy>> {
        Vec::new()
    }
}
