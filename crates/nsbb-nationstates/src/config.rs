//! Plugin settings.

use serde::Deserialize;
use std::time::Duration;

/// NationStates endpoints and client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NationStatesConfig {
    /// Verification API endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Page where players obtain their verification code.
    #[serde(default = "default_verify_page_url")]
    pub verify_page_url: String,

    /// Base of the canonical `nation=`/`region=` pages used by markup links.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// User-Agent sent to the API. NationStates asks clients to identify themselves.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Verification request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://www.nationstates.net/cgi-bin/api.cgi".to_string()
}

fn default_verify_page_url() -> String {
    "https://www.nationstates.net/page=verify_login".to_string()
}

fn default_site_url() -> String {
    "https://www.nationstates.net".to_string()
}

fn default_user_agent() -> String {
    concat!("nsbb/", env!("CARGO_PKG_VERSION"), " (forum nation verification)").to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for NationStatesConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            verify_page_url: default_verify_page_url(),
            site_url: default_site_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NationStatesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: NationStatesConfig =
            toml::from_str("api_url = \"http://127.0.0.1:9/api.cgi\"").unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:9/api.cgi");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.site_url, "https://www.nationstates.net");
        assert!(config.user_agent.starts_with("nsbb/"));
    }
}
