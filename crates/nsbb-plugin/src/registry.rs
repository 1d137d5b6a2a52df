//! Ordered plugin registry and hook dispatch.

use crate::{ForumPlugin, PluginError, RegistrationForm, SubmissionId};
use nsbb_db::MigrationError;
use nsbb_markup::{BlockParser, PostRenderer};
use nsbb_types::{Post, User};
use rusqlite::Connection;
use std::sync::Arc;

/// Installed plugins, dispatched in registration order.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn ForumPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn ForumPlugin>) -> Self {
        self.register(plugin);
        self
    }

    pub fn register(&mut self, plugin: Arc<dyn ForumPlugin>) {
        tracing::info!(plugin = plugin.name(), "registered plugin");
        self.plugins.push(plugin);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Runs every plugin's migrations. Core migrations must have run first.
    pub fn run_migrations(&self, conn: &Connection) -> Result<usize, MigrationError> {
        let mut applied = 0;
        for plugin in &self.plugins {
            let count = nsbb_db::run_plugin_migrations(conn, plugin.migrations())?;
            if count > 0 {
                tracing::info!(plugin = plugin.name(), count, "applied plugin migrations");
            }
            applied += count;
        }
        Ok(applied)
    }

    pub fn extend_registration_form(&self, form: &mut RegistrationForm) {
        for plugin in &self.plugins {
            plugin.extend_registration_form(form);
        }
    }

    /// Concatenated registration form fragments of all plugins.
    pub fn registration_form_fragments(&self, form: &RegistrationForm) -> String {
        self.plugins
            .iter()
            .filter_map(|p| p.registration_form_fragment(form))
            .collect()
    }

    /// Fires the registration-completed event. Stops at the first failure.
    pub fn user_registered(
        &self,
        conn: &Connection,
        username: &str,
        submission: SubmissionId,
    ) -> Result<(), PluginError> {
        for plugin in &self.plugins {
            if let Err(e) = plugin.on_user_registered(conn, username, submission) {
                tracing::error!(
                    plugin = plugin.name(),
                    username,
                    %submission,
                    error = %e,
                    "user registered hook failed"
                );
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn registration_rejected(&self, username: &str, submission: SubmissionId) {
        for plugin in &self.plugins {
            plugin.on_registration_rejected(username, submission);
        }
    }

    /// Concatenated author decorations for `post`.
    pub fn author_info(
        &self,
        conn: &Connection,
        user: &User,
        post: &Post,
    ) -> Result<String, PluginError> {
        let mut html = String::new();
        for plugin in &self.plugins {
            if let Some(fragment) = plugin.post_author_info(conn, user, post)? {
                html.push_str(&fragment);
            }
        }
        Ok(html)
    }

    /// Builds the post renderer from every plugin's rules and strategies.
    pub fn post_renderer(&self) -> PostRenderer {
        let mut parser = BlockParser::new();
        let mut strategies = Vec::new();
        for plugin in &self.plugins {
            for rule in plugin.block_rules() {
                parser.push_rule(rule);
            }
            strategies.extend(plugin.render_strategies());
        }
        PostRenderer::new(parser, strategies)
    }
}
