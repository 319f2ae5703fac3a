//! Client configuration.
//!
//! The base URL is optional so a client can be constructed before the host
//! application knows which Lighthouse account to talk to; operations that
//! need it fail with `ApiError::MissingBaseUrl` until it is set. The token is
//! kept for the host's benefit and is never sent with requests.

use serde::Deserialize;

pub const URL_ENV: &str = "LIGHTHOUSE_URL";
pub const TOKEN_ENV: &str = "LIGHTHOUSE_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read `LIGHTHOUSE_URL` and `LIGHTHOUSE_TOKEN`; empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            base_url: read(URL_ENV),
            token: read(TOKEN_ENV),
        }
    }
}
