use anyhow::{Context, Result};
use cmakit::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest path used when neither a flag nor the config file names one
pub const DEFAULT_MANIFEST: &str = "cmsync.toml";

/// State path used when neither a flag nor the config file names one
pub const DEFAULT_STATE: &str = "cmsync.state.json";

/// Get the config directory path (e.g. ~/.config/cmsync)
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("cmsync"))
}

// ============================================================================
// Settings
// ============================================================================

/// Optional user settings from `config.toml`.
///
/// The management token is never read from disk; it comes from
/// `--token` or `CONTENTFUL_MANAGEMENT_TOKEN`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default manifest path (`~` is expanded)
    pub manifest: Option<String>,
    /// Default state file path (`~` is expanded)
    pub state: Option<String>,
    /// Management API endpoint override
    pub base_url: Option<String>,
}

impl Settings {
    /// Load `config.toml` from the config directory, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?.join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    /// Resolve the manifest path: flag, then settings, then the default.
    pub fn manifest_path(&self, flag: Option<&Path>) -> PathBuf {
        resolve(flag, self.manifest.as_deref(), DEFAULT_MANIFEST)
    }

    /// Resolve the state path: flag, then settings, then the default.
    pub fn state_path(&self, flag: Option<&Path>) -> PathBuf {
        resolve(flag, self.state.as_deref(), DEFAULT_STATE)
    }

    /// Build the API client configuration.
    pub fn client_config(&self, token: Option<&str>, base_url: Option<&str>) -> Result<ClientConfig> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .with_context(|| {
                format!(
                    "No management token: pass --token or set {}",
                    cmakit::config::TOKEN_ENV
                )
            })?;

        let mut config = ClientConfig::new(token);
        if let Some(url) = base_url.or(self.base_url.as_deref()) {
            config = config.with_base_url(url);
        }
        config.user_agent = format!("cmsync/{}", env!("CARGO_PKG_VERSION"));
        Ok(config)
    }
}

fn resolve(flag: Option<&Path>, configured: Option<&str>, default: &str) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    configured.map_or_else(
        || PathBuf::from(default),
        |path| PathBuf::from(shellexpand::tilde(path).as_ref()),
    )
}
