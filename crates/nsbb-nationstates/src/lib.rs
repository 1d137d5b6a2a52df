//! NationStates integration for the nsbb forum.
//!
//! Registration asks for a nation name and the verification code the player
//! gets from NationStates. The code is checked against the verification API
//! while the form is validated, and the verified nation is attached to the
//! user once the host has committed the account. Posts show the author's
//! nation and understand RMB quotes plus `[nation]`/`[region]` tags.

pub mod author;
pub mod binder;
pub mod config;
mod error;
pub mod fields;
pub mod pending;
pub mod store;
pub mod template;
pub mod verify;

pub use config::NationStatesConfig;
pub use error::NationStatesError;
pub use pending::PendingAssignments;
pub use verify::{NsApiClient, VerifyError};

use nsbb_db::Migration;
use nsbb_markup::{
    BlockRule, RenderStrategy, RmbQuoteRule, RmbQuoteStrategy, TagFormatter,
    TagFormatterStrategy,
};
use nsbb_plugin::{ForumPlugin, PluginError, RegistrationForm, SubmissionId};
use nsbb_types::{Post, User};
use rusqlite::Connection;
use std::sync::Arc;

pub const PLUGIN_NAME: &str = "nationstates";

/// Schema changes owned by this plugin.
pub static MIGRATIONS: &[Migration] = &[Migration {
    name: "nationstates_001_user_nation",
    sql: include_str!("migrations/001_user_nation.sql"),
}];

pub struct NationStatesPlugin {
    config: NationStatesConfig,
    client: NsApiClient,
    pending: PendingAssignments,
}

impl NationStatesPlugin {
    pub fn new(config: NationStatesConfig) -> Result<Self, VerifyError> {
        let client = NsApiClient::from_config(&config)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: NationStatesConfig, client: NsApiClient) -> Self {
        Self {
            config,
            client,
            pending: PendingAssignments::new(),
        }
    }

    pub fn pending(&self) -> &PendingAssignments {
        &self.pending
    }

    pub fn config(&self) -> &NationStatesConfig {
        &self.config
    }
}

impl ForumPlugin for NationStatesPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn migrations(&self) -> &'static [Migration] {
        MIGRATIONS
    }

    fn extend_registration_form(&self, form: &mut RegistrationForm) {
        for field in fields::nation_fields(
            self.client.clone(),
            self.pending.clone(),
            &self.config.verify_page_url,
        ) {
            form.add_field(field);
        }
    }

    fn registration_form_fragment(&self, form: &RegistrationForm) -> Option<String> {
        template::registration_fields_html(form)
    }

    fn on_user_registered(
        &self,
        conn: &Connection,
        username: &str,
        submission: SubmissionId,
    ) -> Result<(), PluginError> {
        binder::bind_pending_nation(conn, &self.pending, username, submission)?;
        Ok(())
    }

    fn on_registration_rejected(&self, username: &str, submission: SubmissionId) {
        if self.pending.discard(username, submission) {
            tracing::debug!(username, %submission, "discarded pending nation");
        }
    }

    fn post_author_info(
        &self,
        conn: &Connection,
        user: &User,
        _post: &Post,
    ) -> Result<Option<String>, PluginError> {
        let nation = store::user_nation(conn, user.id)?;
        Ok(author::author_info_html(nation.as_deref()))
    }

    fn block_rules(&self) -> Vec<Arc<dyn BlockRule>> {
        vec![Arc::new(RmbQuoteRule)]
    }

    fn render_strategies(&self) -> Vec<Arc<dyn RenderStrategy>> {
        vec![
            Arc::new(RmbQuoteStrategy::default()),
            Arc::new(TagFormatterStrategy::new(
                TagFormatter::new().with_link_tags(self.config.site_url.clone()),
            )),
        ]
    }
}
