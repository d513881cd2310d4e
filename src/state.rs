use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reconcile::{Applied, DesiredResource, Locator, ResourceKind, StoredAttributes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// State Structures
// ============================================================================

/// Everything cmsync has applied, keyed by manifest address.
///
/// Stored as JSON: content type validations are arbitrary JSON and may
/// contain nulls, which TOML cannot represent.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SyncState {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRecord>,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

/// One applied resource
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResourceRecord {
    pub kind: ResourceKind,

    /// Server-side ID
    pub id: String,

    pub locator: Locator,

    /// Attributes as last read back from the server
    pub attributes: StoredAttributes,

    /// The last apply created or changed the resource but could not finish
    #[serde(default)]
    pub partial: bool,

    pub applied_at: DateTime<Utc>,
}

// ============================================================================
// SyncState Implementation
// ============================================================================

impl SyncState {
    /// Load state from disk, or return default if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, using empty state", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create state directory: {}", dir.display())
            })?;
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize state")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    pub fn get(&self, address: &str) -> Option<&ResourceRecord> {
        self.resources.get(address)
    }

    /// Record the outcome of a create or update.
    pub fn record(&mut self, address: &str, desired: &DesiredResource, applied: &Applied) {
        let record = ResourceRecord {
            kind: desired.kind(),
            id: applied.id.clone(),
            locator: desired.locator(),
            attributes: applied.state.clone(),
            partial: applied.is_partial(),
            applied_at: Utc::now(),
        };
        self.resources.insert(address.to_string(), record);
        self.touch();
    }

    /// Replace the stored attributes after a read.
    pub fn refresh(&mut self, address: &str, attributes: StoredAttributes) {
        if let Some(record) = self.resources.get_mut(address) {
            record.attributes = attributes;
            self.touch();
        }
    }

    pub fn forget(&mut self, address: &str) -> Option<ResourceRecord> {
        let removed = self.resources.remove(address);
        if removed.is_some() {
            self.touch();
        }
        removed
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            resources: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}
