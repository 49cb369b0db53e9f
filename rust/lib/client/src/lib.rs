//! SchoolERP HTTP client.
//!
//! A type-safe client for the school backend's REST resources. All
//! requests go through one [`HttpApi`], which asks a pluggable
//! [`TokenSource`] for the bearer token before every call.
//!
//! # Usage
//!
//! ```ignore
//! use schoolerp_client::{ConfigToken, HttpApi, ResourceClient, ClientConfig};
//!
//! let path = ClientConfig::default_path();
//! let api = Arc::new(HttpApi::new("http://localhost:8000/api", Arc::new(ConfigToken::new(path))));
//! let sections = ResourceClient::<Section>::new(api).list_all().await?;
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod resource;
pub mod token;

pub use config::{ClientConfig, ConfigError, Context, UiConfig};
pub use error::ApiError;
pub use http::HttpApi;
pub use multipart::FilePart;
pub use resource::{ListParams, ListResponse, Page, Resource, ResourceClient};
pub use token::{ConfigToken, NoAuth, PasswordLogin, StaticToken, TokenSource};
