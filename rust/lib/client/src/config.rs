//! Client configuration file.
//!
//! Reads/writes `~/.schoolerp/config.toml`:
//!
//! ```toml
//! current-context = "main-campus"
//!
//! [[contexts]]
//! name = "main-campus"
//! server = "https://school.example.com/api"
//! token = "eyJ..."
//! group = 3
//!
//! [ui]
//! filter_debounce_ms = 300
//! page_size = 25
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("serialize: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no current context")]
    NoContext,
}

/// One backend the admin can talk to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,

    /// API base URL, e.g. `https://school.example.com/api`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Bearer token saved at login.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    /// Permission group of the signed-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<i64>,

    /// Superusers bypass the permission gate.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub superuser: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_debounce_ms")]
    pub filter_debounce_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_page_size() -> u32 {
    25
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            filter_debounce_ms: default_debounce_ms(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    #[serde(default)]
    pub contexts: Vec<Context>,

    #[serde(default)]
    pub ui: UiConfig,
}

impl ClientConfig {
    /// `~/.schoolerp/config.toml`.
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load from disk. A missing file yields the default config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_err)
    }

    pub fn current(&self) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    pub fn upsert_context(&mut self, ctx: Context) {
        if let Some(existing) = self.get_mut(&ctx.name) {
            *existing = ctx;
        } else {
            self.contexts.push(ctx);
        }
    }

    /// Store a fresh token on the named context. Returns false if unknown.
    pub fn set_token(&mut self, name: &str, token: &str) -> bool {
        match self.get_mut(name) {
            Some(ctx) => {
                ctx.token = token.to_string();
                true
            }
            None => false,
        }
    }
}

fn config_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".schoolerp")
}
