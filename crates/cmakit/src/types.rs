//! Remote resource types for the Contentful Management API.
//!
//! Every remote object carries a [`Sys`] envelope owned by the server. The
//! envelope is never serialized into request bodies: IDs and versions travel in
//! the URL and the `X-Contentful-Version` header instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field values of an entry, keyed by field ID and then by locale.
pub type EntryFields = BTreeMap<String, BTreeMap<String, Value>>;

/// The `sys` block of a link object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSys {
    /// ID of the linked object
    pub id: String,
    /// Always `"Link"` for links
    #[serde(rename = "type", default)]
    pub kind: String,
    /// What the link points at (`Space`, `Environment`, `ContentType`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

/// A reference to another remote object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub sys: LinkSys,
}

impl Link {
    /// Create a link of the given type.
    pub fn new(link_type: &str, id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                id: id.into(),
                kind: "Link".to_string(),
                link_type: Some(link_type.to_string()),
            },
        }
    }

    /// ID of the linked object.
    pub fn id(&self) -> &str {
        &self.sys.id
    }
}

/// Server metadata attached to every remote object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Optimistic-concurrency version, absent until the object exists
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub space: Option<Link>,
    #[serde(default)]
    pub environment: Option<Link>,
    #[serde(default)]
    pub content_type: Option<Link>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub published_version: Option<u64>,
    #[serde(default)]
    pub archived_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Sys {
    /// An envelope carrying only an ID (create-with-ID semantics on upsert).
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Published iff `publishedAt` is present and non-empty.
    pub fn is_published(&self) -> bool {
        self.published_at.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// The draft differs from what was last published (or nothing was).
    ///
    /// Publishing bumps the version once, so a clean published object sits at
    /// `publishedVersion + 1`.
    pub fn has_draft_changes(&self) -> bool {
        if !self.is_published() {
            return true;
        }
        match (self.version, self.published_version) {
            (Some(version), Some(published)) => version > published + 1,
            _ => true,
        }
    }

    /// Archived iff `archivedAt` is present and non-empty.
    pub fn is_archived(&self) -> bool {
        self.archived_at.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn space_id(&self) -> &str {
        self.space.as_ref().map_or("", Link::id)
    }

    pub fn environment_id(&self) -> &str {
        self.environment.as_ref().map_or("", Link::id)
    }

    pub fn content_type_id(&self) -> &str {
        self.content_type.as_ref().map_or("", Link::id)
    }
}

/// A space environment, resolved once per reconciliation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub sys: Sys,
}

impl Environment {
    /// Build an environment locator without a round trip to the API.
    pub fn new(space_id: &str, env_id: &str) -> Self {
        Self {
            sys: Sys {
                id: env_id.to_string(),
                kind: "Environment".to_string(),
                space: Some(Link::new("Space", space_id)),
                ..Default::default()
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.sys.id
    }

    pub fn space_id(&self) -> &str {
        self.sys.space_id()
    }
}

/// A content entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, skip_serializing)]
    pub sys: Sys,
    #[serde(default)]
    pub fields: EntryFields,
    /// Default locale of the request; not part of the wire format
    #[serde(skip)]
    pub locale: String,
}

/// Nested type information for `Array` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldItems {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<Value>,
}

/// A field definition of a content type.
///
/// Validations are kept as raw JSON; they are never interpreted client-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<FieldItems>,
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

/// A content type (entry schema).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    #[serde(default, skip_serializing)]
    pub sys: Sys,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A single HTTP header sent with webhook calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookHeader {
    pub key: String,
    pub value: String,
}

/// A webhook definition (space scoped).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    #[serde(default, skip_serializing)]
    pub sys: Sys,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub headers: Vec<WebhookHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_basic_username: Option<String>,
    /// Write-only: never read back from the API
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub http_basic_password: Option<String>,
}
