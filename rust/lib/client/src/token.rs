//! Pluggable bearer-token providers, consulted before every request.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{ClientConfig, ConfigError};
use crate::error::ApiError;

/// Token provider. `Ok(None)` sends the request without `Authorization`.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ApiError>;
}

/// Anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// A token obtained elsewhere.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.0.clone()))
    }
}

/// Token persisted in the client config file.
///
/// The file is re-read on every request, so a token refreshed by another
/// process (or a re-login) is picked up without rebuilding the client.
/// An empty token means anonymous.
pub struct ConfigToken {
    path: PathBuf,
    context: Option<String>,
}

impl ConfigToken {
    /// Use the config's current context.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            context: None,
        }
    }

    /// Pin a named context instead of `current-context`.
    pub fn for_context(path: impl Into<PathBuf>, context: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            context: Some(context.into()),
        }
    }
}

#[async_trait::async_trait]
impl TokenSource for ConfigToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        let path = self.path.clone();
        let config = tokio::task::spawn_blocking(move || ClientConfig::load(&path))
            .await
            .map_err(|e| ApiError::Auth(format!("config reader: {}", e)))??;

        let ctx = match &self.context {
            Some(name) => config.contexts.iter().find(|c| &c.name == name),
            None => config.current(),
        }
        .ok_or(ConfigError::NoContext)?;

        Ok((!ctx.token.is_empty()).then(|| ctx.token.clone()))
    }
}

/// Username/password login with a cached token, renewed when it expires.
///
/// With [`remember_in`](Self::remember_in) every fresh token is also written
/// to a config context, so a later session can start from [`ConfigToken`].
pub struct PasswordLogin {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    remember: Option<(PathBuf, String)>,
    cached: tokio::sync::RwLock<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    /// Seconds since epoch.
    expires_at: i64,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    expires_in: u64,
}

impl PasswordLogin {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            remember: None,
            cached: tokio::sync::RwLock::new(None),
        }
    }

    /// Store each new token on `context` in the config file at `path`.
    pub fn remember_in(mut self, path: impl Into<PathBuf>, context: impl Into<String>) -> Self {
        self.remember = Some((path.into(), context.into()));
        self
    }

    /// A failed write is logged; the token is still used.
    async fn persist(&self, token: &str) {
        let Some((path, context)) = self.remember.clone() else {
            return;
        };
        let token = token.to_string();
        let name = context.clone();
        let saved = tokio::task::spawn_blocking(move || {
            let mut config = ClientConfig::load(&path)?;
            if !config.set_token(&name, &token) {
                return Err(ConfigError::NoContext);
            }
            config.save(&path)
        })
        .await;
        match saved {
            Ok(Ok(())) => info!(%context, "login token saved"),
            Ok(Err(e)) => warn!(%context, error = %e, "login token not saved"),
            Err(e) => warn!(%context, error = %e, "config writer failed"),
        }
    }

    async fn login(&self) -> Result<CachedToken, ApiError> {
        let url = format!("{}/auth/login/", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!("login failed ({}): {}", status, body)));
        }

        let lr: LoginResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("login response: {}", e)))?;

        // Renew 30s early.
        let expires_at = chrono::Utc::now().timestamp() + lr.expires_in as i64 - 30;
        Ok(CachedToken {
            access_token: lr.access_token,
            expires_at,
        })
    }

    fn fresh(cached: &Option<CachedToken>) -> Option<String> {
        cached
            .as_ref()
            .filter(|c| chrono::Utc::now().timestamp() < c.expires_at)
            .map(|c| c.access_token.clone())
    }
}

#[async_trait::async_trait]
impl TokenSource for PasswordLogin {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        if let Some(token) = Self::fresh(&*self.cached.read().await) {
            return Ok(Some(token));
        }

        let mut guard = self.cached.write().await;
        if let Some(token) = Self::fresh(&guard) {
            return Ok(Some(token));
        }
        let fresh = self.login().await?;
        let token = fresh.access_token.clone();
        *guard = Some(fresh);
        self.persist(&token).await;
        Ok(Some(token))
    }
}
