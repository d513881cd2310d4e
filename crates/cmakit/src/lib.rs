//! # cmakit
//!
//! Blocking client for the Contentful Management API.
//!
//! This crate provides:
//! - Typed remote resources (entries, content types, webhooks) with their `sys` envelope
//! - One capability trait per resource kind, bundled by [`backend::Backend`]
//! - An HTTP backend and an in-memory backend for tests
//! - A categorized error type that separates "absent" from real failures
//!
//! ## Example
//!
//! ```no_run
//! use cmakit::backend::Backend;
//! use cmakit::{CallContext, Client, ClientConfig};
//!
//! let client = Client::new(&ClientConfig::from_env().expect("token not set"));
//! let ctx = CallContext::new();
//!
//! let env = client.environments().get(&ctx, "my-space", "master").expect("lookup failed");
//! let entry = client.entries().get(&ctx, &env, "hello-world").expect("get failed");
//! println!("version {:?}, published: {}", entry.sys.version, entry.sys.is_published());
//! ```
//!
//! ## Concurrency control
//!
//! Writes carry the version of the object they were derived from. A stale
//! version fails with [`Error::Conflict`]; nothing is retried automatically.

#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod types;

pub use config::ClientConfig;
pub use context::CallContext;
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    ContentType, Entry, EntryFields, Environment, Field, FieldItems, Link, Sys, Webhook,
    WebhookHeader,
};

use backend::{Backend, ContentTypes, Entries, Environments, Webhooks, http::HttpBackend};

/// High-level client for Management API operations.
///
/// The client wraps a backend and hands out the per-kind services.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client talking to the API over HTTPS.
    pub fn new(config: &ClientConfig) -> Self {
        log::debug!("Using Management API at {}", config.base_url);
        Self {
            backend: Box::new(HttpBackend::new(config)),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

}

/// The client is itself a backend, so reconcilers take it as `&dyn Backend`.
impl Backend for Client {
    fn environments(&self) -> &dyn Environments {
        self.backend.environments()
    }

    fn content_types(&self) -> &dyn ContentTypes {
        self.backend.content_types()
    }

    fn entries(&self) -> &dyn Entries {
        self.backend.entries()
    }

    fn webhooks(&self) -> &dyn Webhooks {
        self.backend.webhooks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::memory::MemoryBackend;

    #[test]
    fn test_client_routes_to_backend() {
        let client = Client::with_backend(Box::new(
            MemoryBackend::new().with_environment("sp1", "master"),
        ));
        let ctx = CallContext::new();
        let env = client.environments().get(&ctx, "sp1", "master").unwrap();
        assert_eq!(env.space_id(), "sp1");

        let err = client.entries().get(&ctx, &env, "missing").unwrap_err();
        assert!(err.is_not_found());
    }
}
