use crate::config::ConfigError;

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response. `body` is the parsed JSON body, if it was JSON.
    #[error("HTTP {status}: {message}")]
    Server {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth: {0}")]
    Auth(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Build a `Server` error from a status and raw response text.
    pub fn server(status: u16, text: String) -> Self {
        let body = serde_json::from_str(&text).ok();
        ApiError::Server {
            status,
            message: text,
            body,
        }
    }

    /// HTTP status for server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Human-readable detail for notifications.
    ///
    /// Prefers a JSON `detail` string, then per-field messages
    /// (`{"name": ["already exists"]}`), then the raw body.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Server { message, body, .. } => body
                .as_ref()
                .and_then(json_detail)
                .unwrap_or_else(|| message.clone()),
            other => other.to_string(),
        }
    }
}

fn json_detail(body: &serde_json::Value) -> Option<String> {
    if let Some(detail) = body.get("detail").and_then(|d| d.as_str()) {
        return Some(detail.to_string());
    }
    if let Some(error) = body.get("error").and_then(|d| d.as_str()) {
        return Some(error.to_string());
    }
    let obj = body.as_object()?;
    let parts: Vec<String> = obj
        .iter()
        .filter_map(|(field, v)| {
            let msg = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => return None,
            };
            (!msg.is_empty()).then(|| format!("{}: {}", field, msg))
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}
