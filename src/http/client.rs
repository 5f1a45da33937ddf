//! Request executor that keeps a bearer token and re-authenticates on rejection.

use log::{debug, warn};
use reqwest::{
    Client, Method, Response,
    header::{AUTHORIZATION, COOKIE, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::retry::{RetryPolicy, StatusClass, classify_status};
use crate::auth::{Token, TokenRefresher, TokenState};
use crate::config::AuthParameters;
use crate::error::ConnectError;

/// Routes `gc-api` calls to the Connect API backend.
pub const DI_BACKEND_HEADER: &str = "di-backend";
pub const DI_BACKEND: &str = "connectapi.garmin.com";

/// Sends requests to the service with a cached bearer token attached.
///
/// A token is fetched before the first request and reused until it goes
/// stale or the service answers 401/403. A rejected request is retried
/// after a forced refresh, up to the policy's attempt budget.
///
/// Requests take `&mut self`: one logical request at a time per client.
pub struct ConnectClient {
    client: Client,
    params: AuthParameters,
    refresher: Box<dyn TokenRefresher>,
    policy: RetryPolicy,
    token: TokenState,
}

impl ConnectClient {
    pub fn new(client: Client, params: AuthParameters, refresher: Box<dyn TokenRefresher>) -> Self {
        Self {
            client,
            params,
            refresher,
            policy: RetryPolicy::default(),
            token: TokenState::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The cached token, if one has been obtained.
    pub fn token(&self) -> Option<&Token> {
        self.token.current()
    }

    /// Obtains a token if none is cached, the cached one is stale, or `force` is set.
    pub async fn ensure_token(&mut self, force: bool) -> Result<Token, ConnectError> {
        if !self.token.needs_refresh(force) {
            if let Some(token) = self.token.current() {
                return Ok(token.clone());
            }
        }

        debug!("Refreshing access token (forced: {})...", force);
        let token = self
            .refresher
            .refresh(&self.params)
            .await
            .map_err(ConnectError::TokenRefresh)?;
        Ok(self.token.replace(token).clone())
    }

    /// Sends `method {base_url}{path}`, re-authenticating on 401/403.
    #[tracing::instrument(skip(self, body))]
    pub async fn execute(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ConnectError> {
        let url = self.params.url_for(path);
        let max_attempts = self.policy.max_attempts();
        let mut force_refresh = false;
        let mut attempt = 1;

        loop {
            let token = self.ensure_token(force_refresh).await?;

            match self.send_once(&method, &url, token.secret(), body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_auth_failure() => {
                    self.token.invalidate();

                    if attempt >= max_attempts {
                        return Err(ConnectError::AuthenticationFailed {
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }

                    warn!(
                        "{} {}: attempt {}/{} rejected ({}), re-authenticating in {}ms...",
                        method,
                        url,
                        attempt,
                        max_attempts,
                        e,
                        self.policy.delay().as_millis()
                    );
                    tokio::time::sleep(self.policy.delay()).await;
                    force_refresh = true;
                    attempt += 1;
                }
                Err(e) => {
                    debug!("{} {}: non-retryable error: {}", method, url, e);
                    return Err(e);
                }
            }
        }
    }

    /// Single request with the given token, no retry.
    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Response, ConnectError> {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth_value.set_sensitive(true);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(AUTHORIZATION, auth_value)
            .header(DI_BACKEND_HEADER, DI_BACKEND);

        if !self.params.cookie.is_empty() {
            let mut cookie = HeaderValue::from_str(&self.params.cookie)?;
            cookie.set_sensitive(true);
            request = request.header(COOKIE, cookie);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("{} {} -> {}", method, url, status);

        match classify_status(status) {
            StatusClass::Success => Ok(response),
            StatusClass::RateLimited => Err(ConnectError::RateLimited {
                method: method.clone(),
                url: url.to_string(),
            }),
            StatusClass::Failure => Err(ConnectError::RequestFailed {
                status,
                method: method.clone(),
                url: url.to_string(),
            }),
        }
    }

    /// GETs `path` and decodes the JSON body. An empty body yields `T::default()`.
    #[tracing::instrument(skip(self))]
    pub async fn decode_response<T: DeserializeOwned + Default>(
        &mut self,
        path: &str,
    ) -> Result<T, ConnectError> {
        let response = self.execute(Method::GET, path, None).await?;
        let bytes = response.bytes().await?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!("Empty response body from {}, using default value", path);
            return Ok(T::default());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get_json<T: DeserializeOwned + Default>(
        &mut self,
        path: &str,
    ) -> Result<T, ConnectError> {
        self.decode_response(path).await
    }

    /// PUTs `body` as JSON to `path`.
    #[tracing::instrument(skip(self, body))]
    pub async fn put_json<B: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &B,
    ) -> Result<Response, ConnectError> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::PUT, path, Some(&body)).await
    }
}
