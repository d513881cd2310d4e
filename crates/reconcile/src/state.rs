//! Stored attributes and operation outcomes.
//!
//! Stored attributes are the subset of remote state the host persists between
//! runs. They never contain write-only credentials.

use crate::desired::{FieldSpec, ResourceKind};
use crate::diagnostics::Diagnostics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted attributes of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryState {
    pub space_id: String,
    pub version: u64,
    pub content_type_id: String,
}

/// Persisted attributes of a webhook. The basic auth password is never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookState {
    pub space_id: String,
    pub version: u64,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_basic_auth_username: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Persisted attributes of a content type: the full schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeState {
    pub space_id: String,
    pub env_id: String,
    pub version: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Stored attributes of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredAttributes {
    ContentType(ContentTypeState),
    Entry(EntryState),
    Webhook(WebhookState),
}

impl StoredAttributes {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::ContentType(_) => ResourceKind::ContentType,
            Self::Entry(_) => ResourceKind::Entry,
            Self::Webhook(_) => ResourceKind::Webhook,
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            Self::ContentType(s) => s.version,
            Self::Entry(s) => s.version,
            Self::Webhook(s) => s.version,
        }
    }
}

/// Result of reading a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The resource exists; its current attributes
    Present(StoredAttributes),
    /// The resource is gone remotely; the host should forget its ID
    Absent,
}

impl ReadOutcome {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Result of a create or update that reached the server.
///
/// When the write succeeded but a follow-up call failed (a lifecycle
/// transition, a schema activation), `diagnostics` carries the errors and the
/// resource counts as partially applied. The ID must still be kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub id: String,
    pub state: StoredAttributes,
    pub diagnostics: Diagnostics,
}

impl Applied {
    pub fn new(id: impl Into<String>, state: StoredAttributes) -> Self {
        Self {
            id: id.into(),
            state,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    pub fn is_partial(&self) -> bool {
        self.diagnostics.has_errors()
    }
}
