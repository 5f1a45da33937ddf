//! Bearer tokens and the refreshers that produce them.
//!
//! The request context never performs a login itself. It asks a
//! [`TokenRefresher`] for a fresh [`Token`] whenever none is cached, the cached
//! one is stale, or the service rejected it.

mod cookie;
mod static_token;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::{AuthParameters, CredentialSource};

pub use cookie::{CookieRefresher, TokenResponse};
pub use static_token::StaticTokenRefresher;

/// An opaque access credential sent as `Authorization: Bearer <token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    access_token: String,
    expires_at: Option<Instant>,
}

impl Token {
    /// A token with no known expiry.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// A token that becomes stale `lifetime` from now.
    pub fn expires_in(access_token: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Some(Instant::now() + lifetime),
        }
    }

    pub fn secret(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn is_stale_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Instant::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &mask_secret(&self.access_token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Holds at most one active token. Refreshing replaces it wholesale.
#[derive(Debug, Default)]
pub struct TokenState {
    token: Option<Token>,
}

impl TokenState {
    pub fn current(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// True when the cached token cannot be used as-is.
    pub fn needs_refresh(&self, force: bool) -> bool {
        force || self.token.as_ref().is_none_or(Token::is_stale)
    }

    pub fn replace(&mut self, token: Token) -> &Token {
        self.token.insert(token)
    }

    pub fn invalidate(&mut self) {
        self.token = None;
    }
}

/// Produces a new access token from the caller's credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, params: &AuthParameters) -> Result<Token>;
}

/// Builds the refresher matching the configured credential source.
pub fn refresher_for(client: Client, params: &AuthParameters) -> Box<dyn TokenRefresher> {
    match &params.credential_source {
        CredentialSource::CookieExchange { token_url } => {
            Box::new(CookieRefresher::new(client, token_url))
        }
        CredentialSource::Static(token) => Box::new(StaticTokenRefresher::new(token.clone())),
    }
}

/// Shows only the edges of a secret, e.g. `eyJh*********9xQ`.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
