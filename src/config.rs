use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// Bridge settings. Both fields may change at runtime; callers always go
/// through [`SharedConfig`] so in-flight requests keep the snapshot they
/// started with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base address of the Shizou server, e.g. `http://localhost:43567`.
    pub server_base_address: String,

    /// Password for the server's single-user login.
    pub server_password: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server_base_address: "http://localhost".to_string(),
            server_password: String::new(),
        }
    }
}

impl BridgeConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            info!(path = %path.display(), "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Default location under the platform config directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shizou-bridge")
            .join("config.toml")
    }
}

/// Shared, runtime-mutable view of the configuration. Readers take a
/// snapshot per outgoing request; writers go through the setters so a
/// change takes effect on the next request without a restart.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<BridgeConfig>>,
}

impl SharedConfig {
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub async fn snapshot(&self) -> BridgeConfig {
        self.inner.read().await.clone()
    }

    pub async fn base_address(&self) -> String {
        self.inner.read().await.server_base_address.clone()
    }

    pub async fn password(&self) -> String {
        self.inner.read().await.server_password.clone()
    }

    pub async fn set_base_address(&self, address: impl Into<String>) {
        let address = address.into();
        info!(address = %address, "Updating server base address");
        self.inner.write().await.server_base_address = address;
    }

    pub async fn set_password(&self, password: impl Into<String>) {
        self.inner.write().await.server_password = password.into();
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}
