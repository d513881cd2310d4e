//! The cmsync manifest.
//!
//! A TOML document with one array of tables per resource kind. Every table
//! carries a `key`; `<kind>.<key>` is the address that ties a declaration to
//! its record in the state file. `[defaults]` fills in `space_id` and
//! `env_id` where a declaration leaves them out.
//!
//! ```toml
//! [defaults]
//! space_id = "abc123"
//! env_id = "master"
//!
//! [[content_type]]
//! key = "post"
//! content_type_id = "blogPost"
//! name = "Blog Post"
//! display_field = "title"
//! fields = [
//!     { id = "title", name = "Title", type = "Symbol", required = true },
//! ]
//!
//! [[entry]]
//! key = "hello"
//! content_type_id = "blogPost"
//! locale = "en-US"
//! published = true
//! fields = [{ id = "title", content = "Hello" }]
//! ```

use anyhow::{Context, Result, bail};
use reconcile::{DesiredResource, ResourceKind};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// A declaration and its address.
#[derive(Debug, Clone, PartialEq)]
pub struct Declared {
    pub address: String,
    pub resource: DesiredResource,
}

/// All declarations, in manifest order (content types, then entries, then webhooks).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub resources: Vec<Declared>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    defaults: Defaults,
    #[serde(default)]
    content_type: Vec<toml::Table>,
    #[serde(default)]
    entry: Vec<toml::Table>,
    #[serde(default)]
    webhook: Vec<toml::Table>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Defaults {
    space_id: Option<String>,
    env_id: Option<String>,
}

impl Defaults {
    fn declare(&self, kind: ResourceKind, mut table: toml::Table) -> Result<Declared> {
        let key = match table.remove("key") {
            Some(toml::Value::String(key)) if !key.trim().is_empty() => key,
            Some(_) => bail!("every {kind} needs a non-empty string key"),
            None => bail!("a {kind} declaration is missing its key"),
        };
        let address = format!("{kind}.{key}");

        if let Some(space_id) = &self.space_id {
            table
                .entry("space_id")
                .or_insert(toml::Value::String(space_id.clone()));
        }
        if kind.is_environment_scoped()
            && let Some(env_id) = &self.env_id
        {
            table
                .entry("env_id")
                .or_insert(toml::Value::String(env_id.clone()));
        }

        let value = toml::Value::Table(table);
        let resource = match kind {
            ResourceKind::ContentType => DesiredResource::ContentType(value.try_into()?),
            ResourceKind::Entry => DesiredResource::Entry(value.try_into()?),
            ResourceKind::Webhook => DesiredResource::Webhook(value.try_into()?),
        };
        Ok(Declared { address, resource })
    }
}

impl Manifest {
    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        let manifest = Self::parse(&content)
            .with_context(|| format!("Invalid manifest: {}", path.display()))?;
        log::debug!(
            "Loaded {} declarations from {}",
            manifest.resources.len(),
            path.display()
        );
        Ok(manifest)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)?;
        let groups = [
            (ResourceKind::ContentType, raw.content_type),
            (ResourceKind::Entry, raw.entry),
            (ResourceKind::Webhook, raw.webhook),
        ];

        let mut seen = BTreeSet::new();
        let mut resources = Vec::new();
        for (kind, tables) in groups {
            for (index, table) in tables.into_iter().enumerate() {
                let declared = raw
                    .defaults
                    .declare(kind, table)
                    .with_context(|| format!("{kind} #{}", index + 1))?;
                if !seen.insert(declared.address.clone()) {
                    bail!("{} is declared twice", declared.address);
                }
                declared
                    .resource
                    .validate()
                    .with_context(|| declared.address.clone())?;
                resources.push(declared);
            }
        }

        Ok(Self { resources })
    }

    pub fn get(&self, address: &str) -> Option<&Declared> {
        self.resources.iter().find(|d| d.address == address)
    }
}
