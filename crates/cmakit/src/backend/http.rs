//! HTTP backend for the Contentful Management API.
//!
//! Uses a blocking `ureq` agent configured to hand back non-2xx responses
//! instead of failing early, so that server error bodies reach the caller
//! verbatim. There is no retry here: a conflict or validation failure is
//! reported exactly once.

use crate::backend::{Backend, ContentTypes, Entries, Environments, Webhooks};
use crate::config::ClientConfig;
use crate::context::CallContext;
use crate::error::{Error, Result};
use crate::types::{ContentType, Entry, Environment, Webhook};
use serde::de::DeserializeOwned;
use ureq::Body;
use ureq::http::Response;

/// Media type expected by the Management API for request bodies.
const MEDIA_TYPE: &str = "application/vnd.contentful.management.v1+json";

/// Header carrying the optimistic-concurrency version.
const VERSION_HEADER: &str = "X-Contentful-Version";

/// Header naming the content type of an entry being written.
const CONTENT_TYPE_HEADER: &str = "X-Contentful-Content-Type";

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Management API backend over HTTPS.
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL.
    base_url: String,
    /// Precomputed `Authorization` header value.
    authorization: String,
    user_agent: String,
}

impl HttpBackend {
    /// Create a backend from client configuration.
    pub fn new(config: &ClientConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url: config.base_url.clone(),
            authorization: format!("Bearer {}", config.token),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Get the current API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn env_path(env: &Environment) -> String {
        format!("/spaces/{}/environments/{}", env.space_id(), env.id())
    }

    fn version_header(version: Option<u64>) -> Vec<(&'static str, String)> {
        version
            .map(|v| vec![(VERSION_HEADER, v.to_string())])
            .unwrap_or_default()
    }

    /// Send one request. Cancellation is checked before anything goes on the wire.
    fn send(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        headers: &[(&'static str, String)],
        body: Option<String>,
    ) -> Result<Response<Body>> {
        ctx.check()?;
        let url = self.url(path);
        log::debug!("{method:?} {url}");

        let response = match method {
            Method::Get => self.with_headers(self.agent.get(&url), headers).call()?,
            Method::Delete => self.with_headers(self.agent.delete(&url), headers).call()?,
            Method::Post | Method::Put => {
                let request = match method {
                    Method::Post => self.agent.post(&url),
                    _ => self.agent.put(&url),
                };
                let request = self.with_headers(request, headers);
                match body {
                    Some(body) => request.header("Content-Type", MEDIA_TYPE).send(body)?,
                    None => request.send_empty()?,
                }
            }
        };

        log::debug!("{method:?} {url} -> {}", response.status().as_u16());
        Ok(response)
    }

    fn with_headers<B>(
        &self,
        mut request: ureq::RequestBuilder<B>,
        headers: &[(&'static str, String)],
    ) -> ureq::RequestBuilder<B> {
        request = request
            .header("Authorization", self.authorization.as_str())
            .header("User-Agent", self.user_agent.as_str());
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        request
    }

    /// Send a request and decode the JSON body of a successful response.
    #[allow(clippy::too_many_arguments)]
    fn call<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        headers: &[(&'static str, String)],
        body: Option<String>,
        kind: &str,
        id: &str,
    ) -> Result<T> {
        let mut response = self.send(ctx, method, path, headers, body)?;
        let status = response.status();
        let text = response.body_mut().read_to_string()?;
        if !status.is_success() {
            return Err(Error::from_status(status.as_u16(), kind, id, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request whose successful response carries no body.
    fn call_empty(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        headers: &[(&'static str, String)],
        kind: &str,
        id: &str,
    ) -> Result<()> {
        let mut response = self.send(ctx, method, path, headers, None)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.body_mut().read_to_string().unwrap_or_default();
        Err(Error::from_status(status.as_u16(), kind, id, &text))
    }

    /// POST to the collection when no ID is set, PUT to the item otherwise.
    fn upsert_target(collection: String, id: &str) -> (Method, String) {
        if id.is_empty() {
            (Method::Post, collection)
        } else {
            (Method::Put, format!("{collection}/{id}"))
        }
    }
}

impl Environments for HttpBackend {
    fn get(&self, ctx: &CallContext, space_id: &str, env_id: &str) -> Result<Environment> {
        let path = format!("/spaces/{space_id}/environments/{env_id}");
        self.call(ctx, Method::Get, &path, &[], None, "Environment", env_id)
    }
}

impl ContentTypes for HttpBackend {
    fn get(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<ContentType> {
        let path = format!("{}/content_types/{id}", Self::env_path(env));
        self.call(ctx, Method::Get, &path, &[], None, "ContentType", id)
    }

    fn upsert(
        &self,
        ctx: &CallContext,
        env: &Environment,
        ct: &ContentType,
    ) -> Result<ContentType> {
        let body = serde_json::to_string(ct)?;
        let headers = Self::version_header(ct.sys.version);
        let collection = format!("{}/content_types", Self::env_path(env));
        let (method, path) = Self::upsert_target(collection, &ct.sys.id);
        self.call(ctx, method, &path, &headers, Some(body), "ContentType", &ct.sys.id)
    }

    fn delete(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<()> {
        let path = format!("{}/content_types/{id}", Self::env_path(env));
        self.call_empty(ctx, Method::Delete, &path, &[], "ContentType", id)
    }

    fn activate(
        &self,
        ctx: &CallContext,
        env: &Environment,
        ct: &ContentType,
    ) -> Result<ContentType> {
        let path = format!("{}/content_types/{}/published", Self::env_path(env), ct.sys.id);
        let headers = Self::version_header(ct.sys.version);
        self.call(ctx, Method::Put, &path, &headers, None, "ContentType", &ct.sys.id)
    }

    fn deactivate(
        &self,
        ctx: &CallContext,
        env: &Environment,
        ct: &ContentType,
    ) -> Result<ContentType> {
        let path = format!("{}/content_types/{}/published", Self::env_path(env), ct.sys.id);
        self.call(ctx, Method::Delete, &path, &[], None, "ContentType", &ct.sys.id)
    }
}

impl Entries for HttpBackend {
    fn get(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<Entry> {
        let path = format!("{}/entries/{id}", Self::env_path(env));
        self.call(ctx, Method::Get, &path, &[], None, "Entry", id)
    }

    fn upsert(
        &self,
        ctx: &CallContext,
        env: &Environment,
        content_type_id: &str,
        entry: &Entry,
    ) -> Result<Entry> {
        let body = serde_json::to_string(entry)?;
        let mut headers = vec![(CONTENT_TYPE_HEADER, content_type_id.to_string())];
        headers.extend(Self::version_header(entry.sys.version));
        let collection = format!("{}/entries", Self::env_path(env));
        let (method, path) = Self::upsert_target(collection, &entry.sys.id);
        self.call(ctx, method, &path, &headers, Some(body), "Entry", &entry.sys.id)
    }

    fn delete(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<()> {
        let path = format!("{}/entries/{id}", Self::env_path(env));
        self.call_empty(ctx, Method::Delete, &path, &[], "Entry", id)
    }

    fn publish(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry> {
        let path = format!("{}/entries/{}/published", Self::env_path(env), entry.sys.id);
        let headers = Self::version_header(entry.sys.version);
        self.call(ctx, Method::Put, &path, &headers, None, "Entry", &entry.sys.id)
    }

    fn unpublish(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry> {
        let path = format!("{}/entries/{}/published", Self::env_path(env), entry.sys.id);
        let headers = Self::version_header(entry.sys.version);
        self.call(ctx, Method::Delete, &path, &headers, None, "Entry", &entry.sys.id)
    }

    fn archive(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry> {
        let path = format!("{}/entries/{}/archived", Self::env_path(env), entry.sys.id);
        let headers = Self::version_header(entry.sys.version);
        self.call(ctx, Method::Put, &path, &headers, None, "Entry", &entry.sys.id)
    }

    fn unarchive(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry> {
        let path = format!("{}/entries/{}/archived", Self::env_path(env), entry.sys.id);
        let headers = Self::version_header(entry.sys.version);
        self.call(ctx, Method::Delete, &path, &headers, None, "Entry", &entry.sys.id)
    }
}

impl Webhooks for HttpBackend {
    fn get(&self, ctx: &CallContext, space_id: &str, id: &str) -> Result<Webhook> {
        let path = format!("/spaces/{space_id}/webhook_definitions/{id}");
        self.call(ctx, Method::Get, &path, &[], None, "Webhook", id)
    }

    fn upsert(&self, ctx: &CallContext, space_id: &str, webhook: &Webhook) -> Result<Webhook> {
        let body = serde_json::to_string(webhook)?;
        let headers = Self::version_header(webhook.sys.version);
        let collection = format!("/spaces/{space_id}/webhook_definitions");
        let (method, path) = Self::upsert_target(collection, &webhook.sys.id);
        self.call(ctx, method, &path, &headers, Some(body), "Webhook", &webhook.sys.id)
    }

    fn delete(&self, ctx: &CallContext, space_id: &str, webhook: &Webhook) -> Result<()> {
        let path = format!("/spaces/{space_id}/webhook_definitions/{}", webhook.sys.id);
        let headers = Self::version_header(webhook.sys.version);
        self.call_empty(ctx, Method::Delete, &path, &headers, "Webhook", &webhook.sys.id)
    }
}

impl Backend for HttpBackend {
    fn environments(&self) -> &dyn Environments {
        self
    }

    fn content_types(&self) -> &dyn ContentTypes {
        self
    }

    fn entries(&self) -> &dyn Entries {
        self
    }

    fn webhooks(&self) -> &dyn Webhooks {
        self
    }
}
