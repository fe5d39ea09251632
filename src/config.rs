//! Configuration loading and validation.
//!
//! Precedence: environment variables > TOML file > defaults. The file is
//! optional; a bare `pushkontak` run works against a local bridge with an
//! on-disk SQLite database.

use std::path::Path;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// WhatsApp bridge settings.
    pub bridge: BridgeConfig,

    /// Contact persistence settings.
    pub storage: StorageConfig,
}

/// HTTP server settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub bind: String,

    /// Listen port. Overridable with `PORT`.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_owned(),
            port: default_port(),
        }
    }
}

/// WhatsApp bridge settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the whatsapp-web bridge. Overridable with
    /// `PUSHKONTAK_BRIDGE_URL`.
    pub base_url: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3001".to_owned(),
        }
    }
}

/// Contact persistence settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database URL. Overridable with `PUSHKONTAK_DATABASE_URL`.
    /// When the database cannot be opened the backend falls back to an
    /// in-memory no-op store; that is logged, not fatal.
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://pushkontak.db".to_owned(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from an optional TOML file, then apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is given but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) => {
                let contents = std::fs::read_to_string(p).map_err(|e| {
                    anyhow::anyhow!("failed to read config at {}: {e}", p.display())
                })?;
                toml::from_str(&contents).map_err(|e| {
                    anyhow::anyhow!("failed to parse config at {}: {e}", p.display())
                })?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("PUSHKONTAK_BRIDGE_URL") {
            self.bridge.base_url = url;
        }
        if let Ok(url) = std::env::var("PUSHKONTAK_DATABASE_URL") {
            self.storage.database_url = url;
        }
    }
}
