//! Client for the NationStates verification API.

use crate::config::NationStatesConfig;
use std::time::Duration;
use thiserror::Error;

/// Value of the `a` query parameter selecting the verify action.
pub const VERIFY_ACTION: &str = "verify";

/// Longest slice of an unexpected response body kept for diagnostics.
const MAX_BODY_EXCERPT: usize = 64;

/// Errors talking to the verification API.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid verification endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection failure, timeout or non-2xx status.
    #[error("verification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected verification response: {0:?}")]
    MalformedBody(String),
}

/// Checks nation ownership codes against the verification endpoint.
#[derive(Debug, Clone)]
pub struct NsApiClient {
    http: reqwest::Client,
    api_url: url::Url,
}

impl NsApiClient {
    pub fn new(api_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, VerifyError> {
        let api_url = url::Url::parse(api_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { http, api_url })
    }

    pub fn from_config(config: &NationStatesConfig) -> Result<Self, VerifyError> {
        Self::new(&config.api_url, &config.user_agent, config.timeout())
    }

    /// Asks whether `checksum` proves control of `nation`.
    ///
    /// The endpoint answers with a plain-text integer; nonzero means verified.
    pub async fn verify(&self, nation: &str, checksum: &str) -> Result<bool, VerifyError> {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("a", VERIFY_ACTION)
            .append_pair("nation", nation)
            .append_pair("checksum", checksum);

        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_verify_body(&body)
    }
}

fn parse_verify_body(body: &str) -> Result<bool, VerifyError> {
    let trimmed = body.trim();
    trimmed
        .parse::<i64>()
        .map(|value| value != 0)
        .map_err(|_| VerifyError::MalformedBody(trimmed.chars().take(MAX_BODY_EXCERPT).collect()))
}
