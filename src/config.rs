// Secrets and engine connection settings
//
// Stored in ~/.roundtable/secrets.toml (global only, not per data dir).
// Holds retriever API keys, the engine endpoint, and the credential table
// for the bearer-token auth provider.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

fn default_engine_timeout_secs() -> u64 {
    // Engine calls run retrieval rounds; minutes are normal
    600
}

/// Secrets stored in ~/.roundtable/secrets.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    /// Retriever API keys indexed by provider key (e.g. "bing" -> "...")
    #[serde(default)]
    pub api_tokens: HashMap<String, String>,

    /// Bearer credentials mapped to user identities. Empty means the server
    /// generates a single-user token at startup.
    #[serde(default)]
    pub credentials: HashMap<String, String>,

    /// Base URL of the research engine service
    #[serde(default)]
    pub engine_url: Option<String>,

    /// Per-call timeout for engine requests, in seconds
    #[serde(default = "default_engine_timeout_secs")]
    pub engine_timeout_secs: u64,
}

impl SecretsConfig {
    /// Get the secrets file path (~/.roundtable/secrets.toml)
    pub fn get_secrets_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".roundtable").join("secrets.toml"))
    }

    /// Load secrets from the default location
    pub fn load() -> Result<Self> {
        let path =
            Self::get_secrets_path().ok_or_else(|| anyhow!("Could not determine home directory"))?;
        Self::load_from(&path)
    }

    /// Load secrets from an explicit path (missing file is an empty config)
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read secrets file '{}': {}", path.display(), e))?;

        let config: SecretsConfig = toml::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse secrets file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save secrets to the default location
    pub fn save(&self) -> Result<()> {
        let path =
            Self::get_secrets_path().ok_or_else(|| anyhow!("Could not determine home directory"))?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    anyhow!(
                        "Failed to create secrets directory '{}': {}",
                        parent.display(),
                        e
                    )
                })?;
            }
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| anyhow!("Failed to serialize secrets: {}", e))?;

        fs::write(&path, contents)
            .map_err(|e| anyhow!("Failed to write secrets file '{}': {}", path.display(), e))?;

        // Owner read/write only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, permissions).map_err(|e| {
                anyhow!(
                    "Failed to set permissions on secrets file '{}': {}",
                    path.display(),
                    e
                )
            })?;
        }

        log::info!("Saved secrets to: {}", path.display());
        Ok(())
    }

    /// Get a retriever provider's API key
    pub fn get_token(&self, provider_key: &str) -> Option<&String> {
        self.api_tokens.get(provider_key)
    }
}
