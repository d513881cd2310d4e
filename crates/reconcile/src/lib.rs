//! # Reconcile
//!
//! Declarative reconciliation of Contentful resources.
//!
//! This crate turns a declared target state into the minimal sequence of
//! Management API calls that makes a space match it, and reports every
//! failure back as diagnostics instead of aborting.
//!
//! ## Core Concepts
//!
//! - **DesiredResource**: a declared content type, entry or webhook
//! - **Mapper**: pure translation between the declared and the remote shape
//! - **Synchronizer**: moves an entry's published/archived flags with the fewest calls
//! - **ResourceDriver**: create, read, update and delete for one resource kind
//! - **Diagnostics**: ordered (severity, summary, detail) records for the host
//!
//! ## Example
//!
//! ```ignore
//! use cmakit::{Client, ClientConfig};
//! use reconcile::{DesiredResource, Driver, ReconcileContext};
//!
//! let client = Client::new(&ClientConfig::from_env()?);
//! let driver = Driver::new(ReconcileContext::new(&client));
//!
//! match driver.create(&desired) {
//!     Ok(applied) if applied.is_partial() => { /* keep applied.id, report diagnostics */ }
//!     Ok(applied) => { /* persist applied.id and applied.state */ }
//!     Err(diagnostics) => { /* nothing was created */ }
//! }
//! ```
//!
//! ## Dependency injection
//!
//! There is no global client. A [`ReconcileContext`] wraps any
//! [`cmakit::backend::Backend`] plus a cancellation signal and is passed by
//! reference into every operation, so tests run against
//! [`cmakit::backend::memory::MemoryBackend`].

pub mod context;
pub mod desired;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod lifecycle;
pub mod mapper;
pub mod resource;
pub mod state;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{ReconcileContext, Scope};
pub use desired::{
    ContentTypeSpec, DesiredResource, EntrySpec, FieldContent, FieldSpec, ItemsSpec, Locator,
    ResourceKind, WebhookSpec,
};
pub use diagnostics::{Diagnostic, Diagnostics, OpResult, Severity};
pub use driver::{ContentTypeDriver, Driver, EntryDriver, WebhookDriver};
pub use error::{Error, Result};
pub use lifecycle::{LifecycleFlags, SyncReport, Transition};
pub use resource::ResourceDriver;
pub use state::{Applied, ContentTypeState, EntryState, ReadOutcome, StoredAttributes, WebhookState};
pub use value::{FieldValue, coerce};
