//! Client configuration: credentials plus the two API base URLs.

use std::fmt;

use serde::Deserialize;

pub const COMPUTE_URL: &str = "https://api.cloud.online.net";
pub const ACCOUNT_URL: &str = "https://account.cloud.online.net";

/// Credentials and endpoints for one API account.
///
/// Deserializable so callers can keep it in whatever file format they use;
/// missing base URLs fall back to the production endpoints.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub user_id: String,
    pub token: String,
    pub organization: String,
    #[serde(default = "default_compute_url", deserialize_with = "base_url")]
    pub compute_url: String,
    #[serde(default = "default_account_url", deserialize_with = "base_url")]
    pub account_url: String,
}

fn default_compute_url() -> String {
    COMPUTE_URL.to_string()
}

fn default_account_url() -> String {
    ACCOUNT_URL.to_string()
}

fn base_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let url = String::deserialize(deserializer)?;
    Ok(trim_base(&url))
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

impl ClientConfig {
    pub fn new(
        user_id: impl Into<String>,
        token: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
            organization: organization.into(),
            compute_url: default_compute_url(),
            account_url: default_account_url(),
        }
    }

    pub fn with_compute_url(mut self, url: &str) -> Self {
        self.compute_url = trim_base(url);
        self
    }

    pub fn with_account_url(mut self, url: &str) -> Self {
        self.account_url = trim_base(url);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .field("organization", &self.organization)
            .field("compute_url", &self.compute_url)
            .field("account_url", &self.account_url)
            .finish()
    }
}
