//! The shared authenticated HTTP layer.
//!
//! Every resource client goes through one `HttpApi`, so the bearer token is
//! attached in exactly one place.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::token::TokenSource;

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, token_source: Arc<dyn TokenSource>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token_source)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token_source: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_source,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a relative API path. The path always ends in `/`.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{}/", self.base_url)
        } else {
            format!("{}/{}/", self.base_url, path)
        }
    }

    /// Request builder for `path` with the bearer token attached.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path);
        debug!(%method, %url, "api request");
        let builder = self.http.request(method, url);
        match self.token_source.token().await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    /// Send and decode a JSON body, mapping non-2xx to `ApiError::Server`.
    pub async fn send_json<R: DeserializeOwned>(builder: RequestBuilder) -> Result<R, ApiError> {
        let resp = Self::check(builder.send().await?).await?;
        resp.json::<R>()
            .await
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }

    /// Send and ignore the body of a successful response.
    pub async fn send_empty(builder: RequestBuilder) -> Result<(), ApiError> {
        Self::check(builder.send().await?).await.map(|_| ())
    }

    async fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        Err(ApiError::server(status.as_u16(), text))
    }
}
