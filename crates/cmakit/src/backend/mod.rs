//! Backend abstraction for Management API operations.
//!
//! The API is split into one capability trait per resource kind so that
//! callers can be handed only the narrow interface they need. A [`Backend`]
//! bundles the four services, allowing for different implementations:
//! - [`http::HttpBackend`] talks to the real API over HTTPS
//! - [`memory::MemoryBackend`] keeps everything in memory for tests

pub mod http;
pub mod memory;

use crate::context::CallContext;
use crate::error::Result;
use crate::types::{ContentType, Entry, Environment, Webhook};

/// Space environment lookup.
pub trait Environments: Send + Sync {
    /// Resolve an environment of a space.
    fn get(&self, ctx: &CallContext, space_id: &str, env_id: &str) -> Result<Environment>;
}

/// Content type (schema) operations.
pub trait ContentTypes: Send + Sync {
    fn get(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<ContentType>;

    /// Create or update a content type.
    ///
    /// Without `sys.id` the server assigns an ID. With `sys.id` and no version
    /// the type is created under that ID; with a version it is updated, and a
    /// stale version fails with a conflict.
    fn upsert(&self, ctx: &CallContext, env: &Environment, ct: &ContentType)
    -> Result<ContentType>;

    fn delete(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<()>;

    /// Activate (publish) the current version of the schema.
    fn activate(
        &self,
        ctx: &CallContext,
        env: &Environment,
        ct: &ContentType,
    ) -> Result<ContentType>;

    fn deactivate(
        &self,
        ctx: &CallContext,
        env: &Environment,
        ct: &ContentType,
    ) -> Result<ContentType>;
}

/// Entry operations.
pub trait Entries: Send + Sync {
    fn get(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<Entry>;

    /// Create or update an entry of the given content type.
    ///
    /// Same ID and version semantics as [`ContentTypes::upsert`].
    fn upsert(
        &self,
        ctx: &CallContext,
        env: &Environment,
        content_type_id: &str,
        entry: &Entry,
    ) -> Result<Entry>;

    fn delete(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<()>;

    fn publish(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry>;

    fn unpublish(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry>;

    fn archive(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry>;

    fn unarchive(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry>;
}

/// Webhook operations (space scoped, no environment).
pub trait Webhooks: Send + Sync {
    fn get(&self, ctx: &CallContext, space_id: &str, id: &str) -> Result<Webhook>;

    fn upsert(&self, ctx: &CallContext, space_id: &str, webhook: &Webhook) -> Result<Webhook>;

    fn delete(&self, ctx: &CallContext, space_id: &str, webhook: &Webhook) -> Result<()>;
}

/// The full set of services offered by a backend.
pub trait Backend: Send + Sync {
    fn environments(&self) -> &dyn Environments;

    fn content_types(&self) -> &dyn ContentTypes;

    fn entries(&self) -> &dyn Entries;

    fn webhooks(&self) -> &dyn Webhooks;
}
