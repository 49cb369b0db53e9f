use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpApi;
use crate::multipart::FilePart;

/// A REST-addressable backend entity.
///
/// Endpoints: `GET|POST {PATH}/`, `GET|PUT|PATCH|DELETE {PATH}/{id}/`.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection path, e.g. `"classes"` or `"transport-routes"`.
    const PATH: &'static str;

    /// Server id; `None` before creation.
    fn id(&self) -> Option<i64>;
}

// ── List parameters ─────────────────────────────────────────────────

/// Pagination plus key/value filters, sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub filters: Vec<(String, String)>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    /// Add a filter; empty values are skipped.
    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.filters.push((key.into(), value));
        }
        self
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = self.filters.clone();
        if let Some(p) = self.page {
            q.push(("page".into(), p.to_string()));
        }
        if let Some(s) = self.page_size {
            q.push(("page_size".into(), s.to_string()));
        }
        q
    }
}

// ── List response ───────────────────────────────────────────────────

/// A list as returned by the server: either a bare array or a paginated
/// envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged {
        count: usize,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Plain(Vec<T>),
}

/// Normalized list page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_next: bool,
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(resp: ListResponse<T>) -> Self {
        match resp {
            ListResponse::Paged {
                count,
                next,
                results,
                ..
            } => Page {
                items: results,
                total: count,
                has_next: next.is_some(),
            },
            ListResponse::Plain(items) => Page {
                total: items.len(),
                items,
                has_next: false,
            },
        }
    }
}

// ── ResourceClient ──────────────────────────────────────────────────

/// Typed CRUD client for one resource over the shared `HttpApi`.
pub struct ResourceClient<T: Resource> {
    api: Arc<HttpApi>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Resource> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.api))
    }
}

impl<T: Resource> ResourceClient<T> {
    pub fn new(api: Arc<HttpApi>) -> Self {
        Self {
            api,
            _phantom: PhantomData,
        }
    }

    fn item_path(id: i64) -> String {
        format!("{}/{}", T::PATH, id)
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<T>, ApiError> {
        let req = self.api.request(Method::GET, T::PATH).await?;
        let req = req.query(&params.to_query());
        let resp: ListResponse<T> = HttpApi::send_json(req).await?;
        Ok(resp.into())
    }

    /// First page with no filters, items only.
    pub async fn list_all(&self) -> Result<Vec<T>, ApiError> {
        Ok(self.list(&ListParams::default()).await?.items)
    }

    pub async fn get(&self, id: i64) -> Result<T, ApiError> {
        let req = self.api.request(Method::GET, &Self::item_path(id)).await?;
        HttpApi::send_json(req).await
    }

    pub async fn create(&self, item: &T) -> Result<T, ApiError> {
        let req = self.api.request(Method::POST, T::PATH).await?;
        HttpApi::send_json(req.json(item)).await
    }

    /// Full replacement (PUT).
    pub async fn update(&self, id: i64, item: &T) -> Result<T, ApiError> {
        let req = self.api.request(Method::PUT, &Self::item_path(id)).await?;
        HttpApi::send_json(req.json(item)).await
    }

    /// Partial update (PATCH) with only the given fields.
    pub async fn patch(&self, id: i64, fields: &serde_json::Value) -> Result<T, ApiError> {
        let req = self.api.request(Method::PATCH, &Self::item_path(id)).await?;
        HttpApi::send_json(req.json(fields)).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let req = self.api.request(Method::DELETE, &Self::item_path(id)).await?;
        HttpApi::send_empty(req).await
    }

    /// Create with a `multipart/form-data` body: the item's scalar fields
    /// as text parts plus `files`.
    pub async fn create_multipart(&self, item: &T, files: Vec<FilePart>) -> Result<T, ApiError> {
        let form = crate::multipart::form_from(item, files)?;
        let req = self.api.request(Method::POST, T::PATH).await?;
        HttpApi::send_json(req.multipart(form)).await
    }

    /// Multipart variant of `update`.
    pub async fn update_multipart(
        &self,
        id: i64,
        item: &T,
        files: Vec<FilePart>,
    ) -> Result<T, ApiError> {
        let form = crate::multipart::form_from(item, files)?;
        let req = self.api.request(Method::PUT, &Self::item_path(id)).await?;
        HttpApi::send_json(req.multipart(form)).await
    }

    /// POST a multipart body to a sub-path such as `students/bulk-upload`.
    pub async fn upload<R: DeserializeOwned>(
        &self,
        action: &str,
        files: Vec<FilePart>,
    ) -> Result<R, ApiError> {
        let form = crate::multipart::files_only(files)?;
        let path = format!("{}/{}", T::PATH, action);
        let req = self.api.request(Method::POST, &path).await?;
        HttpApi::send_json(req.multipart(form)).await
    }
}
