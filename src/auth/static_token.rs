//! Refresher for a bearer token issued out of band.

use anyhow::{Result, bail};
use async_trait::async_trait;
use log::debug;

use super::{Token, TokenRefresher, mask_secret};
use crate::config::AuthParameters;

/// Hands out the same pre-issued token on every refresh.
///
/// A forced refresh cannot produce anything new, so a rejected static token
/// ends in `AuthenticationFailed` once the attempt budget is spent.
pub struct StaticTokenRefresher {
    token: String,
}

impl StaticTokenRefresher {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenRefresher for StaticTokenRefresher {
    async fn refresh(&self, _params: &AuthParameters) -> Result<Token> {
        if self.token.trim().is_empty() {
            bail!("No access token configured. Set GARMIN_TOKEN or use a session cookie.");
        }
        debug!("Using static access token {}", mask_secret(&self.token));
        Ok(Token::new(self.token.trim()))
    }
}
