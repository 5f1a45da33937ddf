//! Exchanges a web session cookie for an API access token.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::debug;
use reqwest::{
    Client,
    header::{COOKIE, HeaderValue},
};
use serde::Deserialize;
use std::time::Duration;

use super::{Token, TokenRefresher, mask_secret};
use crate::config::AuthParameters;

/// Body returned by the token exchange endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl From<TokenResponse> for Token {
    fn from(r: TokenResponse) -> Self {
        match r.expires_in {
            Some(secs) => Token::expires_in(r.access_token, Duration::from_secs(secs)),
            None => Token::new(r.access_token),
        }
    }
}

/// Posts the session cookie to the token exchange endpoint.
pub struct CookieRefresher {
    client: Client,
    token_url: String,
}

impl CookieRefresher {
    pub fn new(client: Client, token_url: &str) -> Self {
        Self {
            client,
            token_url: token_url.to_string(),
        }
    }
}

#[async_trait]
impl TokenRefresher for CookieRefresher {
    #[tracing::instrument(skip(self, params))]
    async fn refresh(&self, params: &AuthParameters) -> Result<Token> {
        if params.cookie.trim().is_empty() {
            bail!("No session cookie configured. Pass --cookie, --cookie-file or set GARMIN_COOKIE.");
        }

        debug!("Exchanging session cookie at {}...", self.token_url);

        let mut cookie = HeaderValue::from_str(&params.cookie)
            .context("Session cookie is not a valid header value")?;
        cookie.set_sensitive(true);

        let response = self
            .client
            .post(&self.token_url)
            .header(COOKIE, cookie)
            .send()
            .await
            .context("Failed to send token exchange request")?;

        let response = response
            .error_for_status()
            .context("Token exchange was rejected")?;

        let body: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token exchange response")?;

        debug!(
            "Received access token {} (expires in {:?}s)",
            mask_secret(&body.access_token),
            body.expires_in
        );

        Ok(body.into())
    }
}
