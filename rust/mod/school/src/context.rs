//! Backend context shared by every handler.

use std::path::Path;
use std::sync::Arc;

use schoolerp_client::{ClientConfig, ConfigError, ConfigToken, HttpApi, Resource, ResourceClient, UiConfig};

/// What handlers need from the outside world: the authenticated API, the
/// signed-in group and UI tuning.
pub struct SchoolContext {
    pub api: Arc<HttpApi>,
    /// Group whose permissions gate the screens. `None` keeps the gate closed.
    pub group: Option<i64>,
    pub superuser: bool,
    pub ui: UiConfig,
}

impl SchoolContext {
    pub fn new(api: Arc<HttpApi>) -> Self {
        Self {
            api,
            group: None,
            superuser: false,
            ui: UiConfig::default(),
        }
    }

    pub fn with_group(mut self, group: i64) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_superuser(mut self, superuser: bool) -> Self {
        self.superuser = superuser;
        self
    }

    pub fn with_ui(mut self, ui: UiConfig) -> Self {
        self.ui = ui;
        self
    }

    /// Build from the config file's current context. The token is read
    /// from the same file on every request.
    pub fn from_config(path: &Path) -> Result<Self, ConfigError> {
        let config = ClientConfig::load(path)?;
        let ctx = config.current().ok_or(ConfigError::NoContext)?;
        let api = HttpApi::new(
            ctx.server.clone(),
            Arc::new(ConfigToken::for_context(path, ctx.name.clone())),
        );
        Ok(Self {
            api: Arc::new(api),
            group: ctx.group,
            superuser: ctx.superuser,
            ui: config.ui.clone(),
        })
    }

    pub fn client<T: Resource>(&self) -> ResourceClient<T> {
        ResourceClient::new(Arc::clone(&self.api))
    }
}
