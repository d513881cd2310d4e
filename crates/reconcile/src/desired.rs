//! Declared target state.
//!
//! These types are owned by the host and read-only to reconciliation. They
//! mirror what a user writes down, not what the API returns: entry content is
//! free text, webhook headers are a map and credentials are plain options.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Kind of a managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ContentType,
    Entry,
    Webhook,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentType => "content_type",
            Self::Entry => "entry",
            Self::Webhook => "webhook",
        }
    }

    /// Whether resources of this kind live inside an environment.
    pub fn is_environment_scoped(&self) -> bool {
        !matches!(self, Self::Webhook)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resource lives: a space, and for environment-scoped kinds an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub space_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_id: Option<String>,
}

impl Locator {
    pub fn space(space_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            env_id: None,
        }
    }

    pub fn environment(space_id: impl Into<String>, env_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            env_id: Some(env_id.into()),
        }
    }

    /// The environment ID, required for environment-scoped kinds.
    pub fn env_id(&self) -> Result<&str> {
        self.env_id
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                Error::InvalidConfig(format!("space {} needs an environment ID", self.space_id))
            })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.env_id {
            Some(env) => write!(f, "{}/{env}", self.space_id),
            None => f.write_str(&self.space_id),
        }
    }
}

/// One localized field value of an entry, as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldContent {
    pub id: String,
    /// Falls back to the entry locale when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub content: String,
}

/// Desired state of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySpec {
    pub space_id: String,
    pub env_id: String,
    /// Explicit ID; the server assigns one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    pub content_type_id: String,
    pub locale: String,
    #[serde(default)]
    pub fields: Vec<FieldContent>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub archived: bool,
}

impl EntrySpec {
    pub fn locator(&self) -> Locator {
        Locator::environment(&self.space_id, &self.env_id)
    }

    /// Locale a field value is declared for.
    pub fn locale_of<'a>(&'a self, field: &'a FieldContent) -> &'a str {
        field.locale.as_deref().unwrap_or(&self.locale)
    }

    pub fn validate(&self) -> Result<()> {
        require("entry", "content_type_id", &self.content_type_id)?;
        require("entry", "locale", &self.locale)?;

        let mut seen = HashSet::new();
        for field in &self.fields {
            require("entry field", "id", &field.id)?;
            let locale = self.locale_of(field);
            if !seen.insert((field.id.as_str(), locale)) {
                return Err(Error::InvalidConfig(format!(
                    "field {} is declared twice for locale {locale}",
                    field.id
                )));
            }
        }
        Ok(())
    }
}

/// Desired state of a webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSpec {
    pub space_id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_basic_auth_username: Option<String>,
    /// Write-only; never read back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_basic_auth_password: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub topics: Vec<String>,
}

impl WebhookSpec {
    pub fn locator(&self) -> Locator {
        Locator::space(&self.space_id)
    }

    pub fn validate(&self) -> Result<()> {
        require("webhook", "name", &self.name)?;
        require("webhook", "url", &self.url)?;
        if self.topics.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "webhook {} needs at least one topic",
                self.name
            )));
        }
        Ok(())
    }
}

/// Item type of an `Array` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsSpec {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<Value>,
}

/// A declared content type field. Validations are opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsSpec>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub omitted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<Value>,
}

/// Desired state of a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeSpec {
    pub space_id: String,
    pub env_id: String,
    /// Explicit ID; the server assigns one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl ContentTypeSpec {
    pub fn locator(&self) -> Locator {
        Locator::environment(&self.space_id, &self.env_id)
    }

    pub fn validate(&self) -> Result<()> {
        require("content type", "name", &self.name)?;

        let mut seen = HashSet::new();
        for field in &self.fields {
            require("content type field", "id", &field.id)?;
            if !seen.insert(field.id.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "content type {} declares field {} twice",
                    self.name, field.id
                )));
            }
        }
        if let Some(display) = &self.display_field
            && !seen.contains(display.as_str())
        {
            return Err(Error::InvalidConfig(format!(
                "display field {display} is not a field of content type {}",
                self.name
            )));
        }
        Ok(())
    }
}

/// A declared resource of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DesiredResource {
    ContentType(ContentTypeSpec),
    Entry(EntrySpec),
    Webhook(WebhookSpec),
}

impl DesiredResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::ContentType(_) => ResourceKind::ContentType,
            Self::Entry(_) => ResourceKind::Entry,
            Self::Webhook(_) => ResourceKind::Webhook,
        }
    }

    pub fn locator(&self) -> Locator {
        match self {
            Self::ContentType(spec) => spec.locator(),
            Self::Entry(spec) => spec.locator(),
            Self::Webhook(spec) => spec.locator(),
        }
    }

    /// ID the resource should be created under, if it is not server-assigned.
    pub fn explicit_id(&self) -> Option<&str> {
        match self {
            Self::ContentType(spec) => spec.content_type_id.as_deref(),
            Self::Entry(spec) => spec.entry_id.as_deref(),
            Self::Webhook(_) => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ContentType(spec) => spec.validate(),
            Self::Entry(spec) => spec.validate(),
            Self::Webhook(spec) => spec.validate(),
        }
    }
}

fn require(what: &str, attribute: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidConfig(format!("{what} {attribute} must not be empty")));
    }
    Ok(())
}
