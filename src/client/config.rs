use crate::types::constants::{VSN, WEBSOCKET_PATH};
use crate::types::{RealtimeError, Result};
use serde::Deserialize;
use url::Url;

/// Project-level settings the session derives its endpoint from.
///
/// Empty strings are treated the same as missing values.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// Primary base URL; its scheme picks `ws` or `wss`.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Fallback base URL.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Preferred key, sent as the `apikey` query parameter.
    #[serde(default)]
    pub service_key: Option<String>,
    /// Fallback key.
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Informational only.
    #[serde(default)]
    pub project_id: Option<String>,
}

impl RealtimeConfig {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: Some(public_url.into()),
            ..Default::default()
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    pub fn with_anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = Some(key.into());
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Reads `SUPABASE_PUBLIC_URL`, `SUPABASE_API_URL`, `SUPABASE_SERVICE_KEY`,
    /// `SUPABASE_ANON_KEY` and `SUPABASE_PROJECT_ID`, loading a `.env` file first
    /// when one is present.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            public_url: lookup("SUPABASE_PUBLIC_URL"),
            api_url: lookup("SUPABASE_API_URL"),
            service_key: lookup("SUPABASE_SERVICE_KEY"),
            anon_key: lookup("SUPABASE_ANON_KEY"),
            project_id: lookup("SUPABASE_PROJECT_ID"),
        }
    }

    /// Base URL in effect: `public_url`, else `api_url`.
    pub fn base_url(&self) -> Option<&str> {
        non_empty(&self.public_url).or_else(|| non_empty(&self.api_url))
    }

    /// Key in effect: `service_key`, else `anon_key`.
    pub fn api_key(&self) -> Option<&str> {
        non_empty(&self.service_key).or_else(|| non_empty(&self.anon_key))
    }

    /// Build the WebSocket endpoint URL with query parameters.
    ///
    /// `http` maps to `ws`, every other scheme to `wss`. The fixed realtime path
    /// is appended to any path the base URL already has. Without a key the
    /// `apikey` parameter is left out.
    pub fn websocket_url(&self) -> Result<String> {
        let base = self.base_url().ok_or_else(|| {
            RealtimeError::Config("neither public_url nor api_url is set".to_string())
        })?;
        let parsed = Url::parse(base)?;

        let scheme = if parsed.scheme() == "http" { "ws" } else { "wss" };
        let host = parsed
            .host_str()
            .ok_or_else(|| RealtimeError::Config(format!("URL has no host: {}", base)))?;
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = parsed.path().trim_end_matches('/');

        let mut url = Url::parse(&format!(
            "{}://{}{}{}{}",
            scheme, host, port, path, WEBSOCKET_PATH
        ))?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = self.api_key() {
                query.append_pair("apikey", key);
            }
            query.append_pair("vsn", VSN);
        }

        Ok(url.to_string())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
