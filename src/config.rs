//! Connection parameters and how they are resolved from the environment.

use anyhow::{Context, Result, bail};
use log::debug;
use reqwest::{Client, Url};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::auth::{mask_secret, refresher_for};
use crate::http::{ConnectClient, RetryPolicy};
use crate::runtime::Runtime;

pub const DEFAULT_BASE_URL: &str = "https://connect.garmin.com/gc-api";

/// Token exchange endpoint, relative to the site origin.
pub const DEFAULT_TOKEN_PATH: &str = "/services/auth/token/di-oauth/refresh";

pub const COOKIE_ENV: &str = "GARMIN_COOKIE";
pub const TOKEN_ENV: &str = "GARMIN_TOKEN";

/// Where new access tokens come from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Exchange the session cookie at `token_url`.
    CookieExchange { token_url: String },
    /// A token issued out of band.
    Static(String),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::CookieExchange { token_url } => f
                .debug_struct("CookieExchange")
                .field("token_url", token_url)
                .finish(),
            CredentialSource::Static(token) => {
                f.debug_tuple("Static").field(&mask_secret(token)).finish()
            }
        }
    }
}

/// Immutable connection parameters. The request context only reads these.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthParameters {
    pub base_url: String,
    pub cookie: String,
    pub credential_source: CredentialSource,
}

impl AuthParameters {
    pub fn new(base_url: &str, cookie: &str, credential_source: CredentialSource) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie: cookie.trim().to_string(),
            credential_source,
        }
    }

    /// `{base_url}{path}`; `path` is expected to start with `/`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl fmt::Debug for AuthParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthParameters")
            .field("base_url", &self.base_url)
            .field("cookie", &mask_secret(&self.cookie))
            .field("credential_source", &self.credential_source)
            .finish()
    }
}

/// Token exchange URL on the same origin as `base_url`.
pub fn default_token_url(base_url: &str) -> Result<String> {
    let url = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
    Ok(format!(
        "{}{}",
        url.origin().ascii_serialization(),
        DEFAULT_TOKEN_PATH
    ))
}

/// Default cookie file: `<config_dir>/gcx/cookie`.
pub fn default_cookie_file<R: Runtime>(runtime: &R) -> Option<PathBuf> {
    runtime.config_dir().map(|dir| dir.join("gcx").join("cookie"))
}

/// Values given explicitly on the command line (or by a library caller).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub cookie: Option<String>,
    pub cookie_file: Option<PathBuf>,
    pub token: Option<String>,
}

pub struct Config {
    pub params: AuthParameters,
    pub client: Client,
    pub policy: RetryPolicy,
}

impl Config {
    /// Resolves parameters in order: explicit overrides, `GARMIN_*`
    /// variables, then the default cookie file.
    ///
    /// An explicit cookie file wins over an explicit cookie, since the CLI
    /// fills `cookie` from `GARMIN_COOKIE` when the flag is absent.
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let base_url = overrides
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let cookie = resolve_cookie(runtime, overrides.cookie, overrides.cookie_file)?;

        let token = non_empty(overrides.token).or_else(|| non_empty(runtime.env_var(TOKEN_ENV).ok()));
        let credential_source = match token {
            Some(token) => {
                debug!("Using static access token: {}", mask_secret(&token));
                CredentialSource::Static(token)
            }
            None => {
                if cookie.is_empty() {
                    bail!(
                        "No credentials found. Set {} or {}, or store a session cookie in the cookie file.",
                        TOKEN_ENV,
                        COOKIE_ENV
                    );
                }
                CredentialSource::CookieExchange {
                    token_url: default_token_url(&base_url)?,
                }
            }
        };

        let params = AuthParameters::new(&base_url, &cookie, credential_source);
        debug!("Resolved connection parameters: {:?}", params);

        let client = Client::builder().user_agent("gcx-cli").build()?;

        Ok(Self {
            params,
            client,
            policy: RetryPolicy::default(),
        })
    }

    pub fn into_client(self) -> ConnectClient {
        let refresher = refresher_for(self.client.clone(), &self.params);
        ConnectClient::new(self.client, self.params, refresher).with_policy(self.policy)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn resolve_cookie<R: Runtime>(
    runtime: &R,
    cookie: Option<String>,
    cookie_file: Option<PathBuf>,
) -> Result<String> {
    if let Some(path) = cookie_file {
        return read_cookie_file(runtime, &path);
    }

    if let Some(cookie) = non_empty(cookie).or_else(|| non_empty(runtime.env_var(COOKIE_ENV).ok())) {
        return Ok(cookie);
    }

    match default_cookie_file(runtime) {
        Some(path) if runtime.exists(&path) => read_cookie_file(runtime, &path),
        _ => Ok(String::new()),
    }
}

fn read_cookie_file<R: Runtime>(runtime: &R, path: &Path) -> Result<String> {
    debug!("Reading session cookie from {:?}", path);
    let cookie = runtime.read_to_string(path)?;
    Ok(cookie.trim().to_string())
}
