use std::fmt;
use std::sync::Arc;

use trichoscan_core::{FailoverChain, Generate, TrichoscanError};
use trichoscan_gemini::GeminiClient;

/// Canonical environment variable holding the comma-separated API key list.
pub const API_KEYS_ENV: &str = "GEMINI_API_KEYS";

/// Model used when none is configured explicitly.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Builds the credential failover chain from configuration.
///
/// Key order is failover priority: the first key is always tried first.
#[derive(Clone, Default)]
pub struct CredentialPoolBuilder {
    keys: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl fmt::Debug for CredentialPoolBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = if self.keys.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };

        f.debug_struct("CredentialPoolBuilder")
            .field("keys", &keys)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CredentialPoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw comma-separated key list, as the environment variable carries it.
    pub fn keys(mut self, value: impl Into<String>) -> Self {
        self.keys = Some(value.into());
        self
    }

    /// Reads the key list from [`API_KEYS_ENV`].
    pub fn keys_from_env(mut self) -> Self {
        if let Ok(value) = std::env::var(API_KEYS_ENV) {
            self.keys = Some(value);
        }
        self
    }

    pub fn model(mut self, value: impl Into<String>) -> Self {
        self.model = Some(value.into());
        self
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = Some(value.into());
        self
    }

    pub fn build(self) -> Result<FailoverChain, TrichoscanError> {
        let raw = self.keys.ok_or_else(|| {
            TrichoscanError::InvalidConfig(format!("{} is not set", API_KEYS_ENV))
        })?;

        let keys: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(TrichoscanError::InvalidConfig(format!(
                "{} is set but contains no usable keys",
                API_KEYS_ENV
            )));
        }

        let model = self.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let providers = keys
            .into_iter()
            .map(|key| {
                let mut client = GeminiClient::new(key, model);
                if let Some(base_url) = &self.base_url {
                    client = client.with_base_url(base_url.clone());
                }
                Arc::new(client) as Arc<dyn Generate>
            })
            .collect();

        FailoverChain::new(providers)
    }
}
