pub mod refresh;

use futures::future::FutureExt;
use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::types::{RefreshRequest, TokenPair};

use refresh::RefreshSlot;

pub const REFRESH_PATH: &str = "/auth/refresh";

/// A request description that can be dispatched more than once
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Sent without the stored access token
    pub anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> ClientResult<Self> {
        Self::new(Method::POST, path).json(body)
    }

    pub fn put<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> ClientResult<Self> {
        Self::new(Method::PUT, path).json(body)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Credential exchanges (login, register) never carry a bearer token
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    fn is_refresh(&self) -> bool {
        self.path == REFRESH_PATH
    }

    fn carries_token(&self) -> bool {
        !self.anonymous && !self.is_refresh()
    }
}

/// Authenticated HTTP client for the Atlas API.
///
/// Attaches the stored bearer token, and on a 401 joins (or starts) the
/// shared token refresh before retrying the request once.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    refresh: RefreshSlot,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<Session>) -> ClientResult<Self> {
        let base = url::Url::parse(&config.base_url)?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "API base URL '{}' cannot be used as a base",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .gzip(config.enable_gzip)
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                session,
                refresh: RefreshSlot::new(),
            }),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_pending()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send_json(ApiRequest::post(path, body)?).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send_json(ApiRequest::put(path, body)?).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.execute(&ApiRequest::delete(path)).await.map(|_| ())
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let body = self.execute(&request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Dispatch a request, recovering from one 401 through the shared refresh.
    /// Returns the raw response body of a 2xx response.
    pub async fn execute(&self, request: &ApiRequest) -> ClientResult<String> {
        let sent_with = if request.carries_token() {
            self.inner.session.store().get()?.access_token
        } else {
            None
        };

        let response = self.inner.dispatch(request, sent_with.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || request.is_refresh() {
            return Inner::finish(response).await;
        }

        let rejected = match Inner::finish(response).await {
            Ok(body) => return Ok(body),
            Err(e) => e,
        };

        // Sent without credentials (login, register): nothing a refresh can fix
        let Some(sent_with) = sent_with else {
            return Err(rejected);
        };

        let message = rejected.to_string();
        let Some(token) = self.recover(&sent_with).await? else {
            return Err(ClientError::Unauthorized { message });
        };

        // Retried once; a second 401 is final
        let retry = self.inner.dispatch(request, Some(&token)).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            let message = Inner::finish(retry)
                .await
                .err()
                .map(|e| e.to_string())
                .unwrap_or(message);
            warn!("{} {} rejected again after token refresh", request.method, request.path);
            return Err(ClientError::Unauthorized { message });
        }
        Inner::finish(retry).await
    }

    /// Token to retry a rejected request with, or `None` when the session is gone
    async fn recover(&self, sent_with: &str) -> ClientResult<Option<String>> {
        let stored = self.inner.session.store().get()?;
        if let Some((current, _)) = stored.pair() {
            if current != sent_with {
                debug!("Access token already rotated, retrying with the stored token");
                return Ok(Some(current.to_string()));
            }
        }

        Ok(self.refresh_access_token().await)
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Concurrent callers share a single request to the refresh endpoint.
    /// On failure the session is cleared and every caller gets `None`.
    pub async fn refresh_access_token(&self) -> Option<String> {
        let inner = self.inner.clone();
        let (handle, started) = self
            .inner
            .refresh
            .join_or_start(move || Inner::run_refresh(inner).boxed());

        if !started {
            debug!("Joining in-flight token refresh");
        }
        handle.await
    }
}

impl Inner {
    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> ClientResult<reqwest::Response> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .header(header::ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token.filter(|_| request.carries_token()) {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        debug!("{} {} -> {}", request.method, request.path, response.status());
        Ok(response)
    }

    async fn finish(response: reqwest::Response) -> ClientResult<String> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::from_response(status, &body))
        }
    }

    async fn run_refresh(inner: Arc<Inner>) -> Option<String> {
        let outcome = inner.exchange_refresh_token().await;

        let token = match outcome {
            Ok(Some(token)) => {
                debug!("Access token refreshed");
                Some(token)
            }
            Ok(None) => {
                debug!("No refresh token stored; ending session");
                None
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                None
            }
        };

        if token.is_none() {
            if let Err(e) = inner.session.end() {
                warn!("Failed to clear session after refresh failure: {}", e);
            }
        }

        inner.refresh.release();
        token
    }

    async fn exchange_refresh_token(&self) -> ClientResult<Option<String>> {
        let Some(refresh_token) = self.session.store().get()?.refresh_token else {
            return Ok(None);
        };

        let exchanged = self.post_refresh(&refresh_token).await;

        // Logout or a new login while the exchange was in flight wins
        let stored = self.session.store().get()?;
        if stored.refresh_token.as_deref() != Some(refresh_token.as_str()) {
            debug!("Session changed during token refresh, discarding the exchange");
            return Ok(stored.access_token);
        }

        let tokens = exchanged?;
        self.session
            .store()
            .set(&tokens.access_token, &tokens.refresh_token)?;
        Ok(Some(tokens.access_token))
    }

    async fn post_refresh(&self, refresh_token: &str) -> ClientResult<TokenPair> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let request = ApiRequest::post(REFRESH_PATH, &body)?;
        let response = self.dispatch(&request, None).await?;
        let body = Self::finish(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
