//! In-memory backend.
//!
//! Behaves like the Management API closely enough to drive reconciliation
//! tests: it assigns IDs and versions, enforces optimistic concurrency,
//! tracks publish/archive timestamps and refuses the same transitions the
//! real API refuses. Every call is recorded in order, and failures can be
//! scripted per operation.

use crate::backend::{Backend, ContentTypes, Entries, Environments, Webhooks};
use crate::context::CallContext;
use crate::error::{Error, Result};
use crate::types::{ContentType, Entry, Environment, Field, Link, Sys, Webhook};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Operations recorded by [`MemoryBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetEnvironment,
    GetContentType,
    UpsertContentType,
    DeleteContentType,
    Activate,
    Deactivate,
    GetEntry,
    UpsertEntry,
    DeleteEntry,
    Publish,
    Unpublish,
    Archive,
    Unarchive,
    GetWebhook,
    UpsertWebhook,
    DeleteWebhook,
}

impl Op {
    /// Whether this operation changes publish or archive state.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Op::Publish | Op::Unpublish | Op::Archive | Op::Unarchive | Op::Activate | Op::Deactivate
        )
    }
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: Op,
    /// ID the call addressed (empty for creates without an ID)
    pub id: String,
    /// Request body for upserts, as it would go over the wire
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
struct ContentTypeRecord {
    current: ContentType,
    /// Fields as of the last activation
    active_fields: Option<Vec<Field>>,
}

#[derive(Debug, Default)]
struct State {
    environments: HashSet<(String, String)>,
    content_types: HashMap<(String, String, String), ContentTypeRecord>,
    entries: HashMap<(String, String, String), Entry>,
    webhooks: HashMap<(String, String), Webhook>,
    calls: Vec<Call>,
    failures: HashMap<Op, VecDeque<Error>>,
    next_id: u64,
    clock: u64,
}

impl State {
    fn record(&mut self, op: Op, id: &str, payload: Option<serde_json::Value>) -> Result<()> {
        self.calls.push(Call {
            op,
            id: id.to_string(),
            payload,
        });
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn generate_id(&mut self) -> String {
        self.next_id += 1;
        format!("gen{}", self.next_id)
    }

    fn now(&mut self) -> String {
        self.clock += 1;
        format!("2024-01-01T00:{:02}:{:02}.000Z", self.clock / 60, self.clock % 60)
    }

    fn require_env(&self, space_id: &str, env_id: &str) -> Result<()> {
        if self
            .environments
            .contains(&(space_id.to_string(), env_id.to_string()))
        {
            Ok(())
        } else {
            Err(Error::not_found("Environment", env_id))
        }
    }
}

/// Check the version sent by the client against the stored one.
fn check_version(kind: &str, stored: &Sys, sent: Option<u64>) -> Result<()> {
    match sent {
        Some(v) if Some(v) == stored.version => Ok(()),
        Some(v) => Err(Error::Conflict {
            message: format!(
                "{kind} {} is at version {}, request sent {v}",
                stored.id,
                stored.version.unwrap_or_default()
            ),
        }),
        None => Err(Error::Conflict {
            message: format!("{kind} {} already exists", stored.id),
        }),
    }
}

fn bump(sys: &mut Sys, now: String) {
    sys.version = Some(sys.version.unwrap_or_default() + 1);
    sys.updated_at = Some(now);
}

fn env_key(env: &Environment, id: &str) -> (String, String, String) {
    (env.space_id().to_string(), env.id().to_string(), id.to_string())
}

/// Management API fake backed by hash maps.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an environment so that lookups of it succeed.
    pub fn with_environment(self, space_id: &str, env_id: &str) -> Self {
        self.lock()
            .environments
            .insert((space_id.to_string(), env_id.to_string()));
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-call;
        // the maps themselves are still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next call of `op` fail with `error`. Queued failures are consumed in order.
    pub fn fail_next(&self, op: Op, error: Error) {
        self.lock().failures.entry(op).or_default().push_back(error);
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of calls of one operation.
    pub fn count(&self, op: Op) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }

    /// Operations in call order, without IDs or payloads.
    pub fn ops(&self) -> Vec<Op> {
        self.lock().calls.iter().map(|c| c.op).collect()
    }

    /// Forget recorded calls (stored resources are kept).
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Store an entry directly, bypassing the API rules.
    pub fn insert_entry(&self, env: &Environment, entry: Entry) {
        let key = env_key(env, &entry.sys.id);
        self.lock().entries.insert(key, entry);
    }

    /// Current stored copy of an entry.
    pub fn entry(&self, env: &Environment, id: &str) -> Option<Entry> {
        self.lock().entries.get(&env_key(env, id)).cloned()
    }

    /// Current stored copy of a content type.
    pub fn content_type(&self, env: &Environment, id: &str) -> Option<ContentType> {
        self.lock()
            .content_types
            .get(&env_key(env, id))
            .map(|r| r.current.clone())
    }

    /// Current stored copy of a webhook, including its write-only password.
    pub fn webhook(&self, space_id: &str, id: &str) -> Option<Webhook> {
        self.lock()
            .webhooks
            .get(&(space_id.to_string(), id.to_string()))
            .cloned()
    }
}

impl Environments for MemoryBackend {
    fn get(&self, ctx: &CallContext, space_id: &str, env_id: &str) -> Result<Environment> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::GetEnvironment, env_id, None)?;
        state.require_env(space_id, env_id)?;
        Ok(Environment::new(space_id, env_id))
    }
}

impl ContentTypes for MemoryBackend {
    fn get(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<ContentType> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::GetContentType, id, None)?;
        state
            .content_types
            .get(&env_key(env, id))
            .map(|r| r.current.clone())
            .ok_or_else(|| Error::not_found("ContentType", id))
    }

    fn upsert(
        &self,
        ctx: &CallContext,
        env: &Environment,
        ct: &ContentType,
    ) -> Result<ContentType> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::UpsertContentType, &ct.sys.id, Some(serde_json::to_value(ct)?))?;
        state.require_env(env.space_id(), env.id())?;

        let id = if ct.sys.id.is_empty() {
            state.generate_id()
        } else {
            ct.sys.id.clone()
        };
        let now = state.now();
        let key = env_key(env, &id);

        if let Some(record) = state.content_types.get_mut(&key) {
            check_version("ContentType", &record.current.sys, ct.sys.version)?;
            if let Some(active) = &record.active_fields
                && let Some(dropped) = active
                    .iter()
                    .find(|f| !f.omitted && !ct.fields.iter().any(|n| n.id == f.id))
            {
                return Err(Error::Validation {
                    message: format!(
                        "field {} must be omitted and activated before it can be deleted",
                        dropped.id
                    ),
                });
            }
            let mut sys = record.current.sys.clone();
            bump(&mut sys, now);
            record.current = ContentType { sys, ..ct.clone() };
            return Ok(record.current.clone());
        }

        if ct.sys.version.is_some() {
            return Err(Error::not_found("ContentType", &id));
        }
        let stored = ContentType {
            sys: Sys {
                id,
                kind: "ContentType".into(),
                version: Some(1),
                space: Some(Link::new("Space", env.space_id())),
                environment: Some(Link::new("Environment", env.id())),
                created_at: Some(now.clone()),
                updated_at: Some(now),
                ..Default::default()
            },
            ..ct.clone()
        };
        state.content_types.insert(
            key,
            ContentTypeRecord {
                current: stored.clone(),
                active_fields: None,
            },
        );
        Ok(stored)
    }

    fn delete(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<()> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::DeleteContentType, id, None)?;
        let key = env_key(env, id);
        match state.content_types.get(&key) {
            None => Err(Error::not_found("ContentType", id)),
            Some(record) if record.current.sys.is_published() => Err(Error::Validation {
                message: format!("content type {id} is active; deactivate it first"),
            }),
            Some(_) => {
                state.content_types.remove(&key);
                Ok(())
            }
        }
    }

    fn activate(
        &self,
        ctx: &CallContext,
        env: &Environment,
        ct: &ContentType,
    ) -> Result<ContentType> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::Activate, &ct.sys.id, None)?;
        let now = state.now();
        let record = state
            .content_types
            .get_mut(&env_key(env, &ct.sys.id))
            .ok_or_else(|| Error::not_found("ContentType", &ct.sys.id))?;
        check_version("ContentType", &record.current.sys, ct.sys.version)?;

        let sys = &mut record.current.sys;
        sys.published_version = sys.version;
        sys.published_at = Some(now.clone());
        bump(sys, now);
        record.active_fields = Some(record.current.fields.clone());
        Ok(record.current.clone())
    }

    fn deactivate(
        &self,
        ctx: &CallContext,
        env: &Environment,
        ct: &ContentType,
    ) -> Result<ContentType> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::Deactivate, &ct.sys.id, None)?;
        let now = state.now();
        let record = state
            .content_types
            .get_mut(&env_key(env, &ct.sys.id))
            .ok_or_else(|| Error::not_found("ContentType", &ct.sys.id))?;

        let sys = &mut record.current.sys;
        sys.published_at = None;
        sys.published_version = None;
        bump(sys, now);
        record.active_fields = None;
        Ok(record.current.clone())
    }
}

impl MemoryBackend {
    /// Apply a lifecycle transition to a stored entry.
    fn transition(
        &self,
        ctx: &CallContext,
        op: Op,
        env: &Environment,
        entry: &Entry,
        apply: impl FnOnce(&mut Sys, String) -> Result<()>,
    ) -> Result<Entry> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(op, &entry.sys.id, None)?;
        let now = state.now();
        let stored = state
            .entries
            .get_mut(&env_key(env, &entry.sys.id))
            .ok_or_else(|| Error::not_found("Entry", &entry.sys.id))?;
        check_version("Entry", &stored.sys, entry.sys.version)?;

        apply(&mut stored.sys, now.clone())?;
        bump(&mut stored.sys, now);
        Ok(stored.clone())
    }
}

impl Entries for MemoryBackend {
    fn get(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<Entry> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::GetEntry, id, None)?;
        state
            .entries
            .get(&env_key(env, id))
            .cloned()
            .ok_or_else(|| Error::not_found("Entry", id))
    }

    fn upsert(
        &self,
        ctx: &CallContext,
        env: &Environment,
        content_type_id: &str,
        entry: &Entry,
    ) -> Result<Entry> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::UpsertEntry, &entry.sys.id, Some(serde_json::to_value(entry)?))?;
        state.require_env(env.space_id(), env.id())?;

        let id = if entry.sys.id.is_empty() {
            state.generate_id()
        } else {
            entry.sys.id.clone()
        };
        let now = state.now();
        let key = env_key(env, &id);

        if let Some(stored) = state.entries.get_mut(&key) {
            check_version("Entry", &stored.sys, entry.sys.version)?;
            if stored.sys.is_archived() {
                return Err(Error::Validation {
                    message: format!("entry {id} is archived and cannot be updated"),
                });
            }
            stored.fields = entry.fields.clone();
            bump(&mut stored.sys, now);
            return Ok(stored.clone());
        }

        if entry.sys.version.is_some() {
            return Err(Error::not_found("Entry", &id));
        }
        let stored = Entry {
            sys: Sys {
                id,
                kind: "Entry".into(),
                version: Some(1),
                space: Some(Link::new("Space", env.space_id())),
                environment: Some(Link::new("Environment", env.id())),
                content_type: Some(Link::new("ContentType", content_type_id)),
                created_at: Some(now.clone()),
                updated_at: Some(now),
                ..Default::default()
            },
            fields: entry.fields.clone(),
            locale: entry.locale.clone(),
        };
        state.entries.insert(key, stored.clone());
        Ok(stored)
    }

    fn delete(&self, ctx: &CallContext, env: &Environment, id: &str) -> Result<()> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::DeleteEntry, id, None)?;
        let key = env_key(env, id);
        match state.entries.get(&key) {
            None => Err(Error::not_found("Entry", id)),
            Some(entry) if entry.sys.is_published() => Err(Error::Validation {
                message: format!("entry {id} is published; unpublish it first"),
            }),
            Some(_) => {
                state.entries.remove(&key);
                Ok(())
            }
        }
    }

    fn publish(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry> {
        self.transition(ctx, Op::Publish, env, entry, |sys, now| {
            if sys.is_archived() {
                return Err(Error::Validation {
                    message: format!("entry {} is archived and cannot be published", sys.id),
                });
            }
            sys.published_version = sys.version;
            sys.published_at = Some(now);
            Ok(())
        })
    }

    fn unpublish(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry> {
        self.transition(ctx, Op::Unpublish, env, entry, |sys, _| {
            if !sys.is_published() {
                return Err(Error::Validation {
                    message: format!("entry {} is not published", sys.id),
                });
            }
            sys.published_at = None;
            sys.published_version = None;
            Ok(())
        })
    }

    fn archive(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry> {
        self.transition(ctx, Op::Archive, env, entry, |sys, now| {
            if sys.is_published() {
                return Err(Error::Validation {
                    message: format!("entry {} is published and cannot be archived", sys.id),
                });
            }
            sys.archived_at = Some(now);
            Ok(())
        })
    }

    fn unarchive(&self, ctx: &CallContext, env: &Environment, entry: &Entry) -> Result<Entry> {
        self.transition(ctx, Op::Unarchive, env, entry, |sys, _| {
            if !sys.is_archived() {
                return Err(Error::Validation {
                    message: format!("entry {} is not archived", sys.id),
                });
            }
            sys.archived_at = None;
            Ok(())
        })
    }
}

impl Webhooks for MemoryBackend {
    fn get(&self, ctx: &CallContext, space_id: &str, id: &str) -> Result<Webhook> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::GetWebhook, id, None)?;
        state
            .webhooks
            .get(&(space_id.to_string(), id.to_string()))
            .map(|w| Webhook {
                http_basic_password: None,
                ..w.clone()
            })
            .ok_or_else(|| Error::not_found("Webhook", id))
    }

    fn upsert(&self, ctx: &CallContext, space_id: &str, webhook: &Webhook) -> Result<Webhook> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::UpsertWebhook, &webhook.sys.id, Some(serde_json::to_value(webhook)?))?;

        let id = if webhook.sys.id.is_empty() {
            state.generate_id()
        } else {
            webhook.sys.id.clone()
        };
        let now = state.now();
        let key = (space_id.to_string(), id.clone());

        let sys = match state.webhooks.get(&key) {
            Some(stored) => {
                check_version("Webhook", &stored.sys, webhook.sys.version)?;
                let mut sys = stored.sys.clone();
                bump(&mut sys, now);
                sys
            }
            None if webhook.sys.version.is_some() => return Err(Error::not_found("Webhook", &id)),
            None => Sys {
                id,
                kind: "WebhookDefinition".into(),
                version: Some(1),
                space: Some(Link::new("Space", space_id)),
                created_at: Some(now.clone()),
                updated_at: Some(now),
                ..Default::default()
            },
        };
        let stored = Webhook {
            sys,
            ..webhook.clone()
        };
        state.webhooks.insert(key, stored.clone());
        Ok(Webhook {
            http_basic_password: None,
            ..stored
        })
    }

    fn delete(&self, ctx: &CallContext, space_id: &str, webhook: &Webhook) -> Result<()> {
        ctx.check()?;
        let mut state = self.lock();
        state.record(Op::DeleteWebhook, &webhook.sys.id, None)?;
        state
            .webhooks
            .remove(&(space_id.to_string(), webhook.sys.id.clone()))
            .map(|_| ())
            .ok_or_else(|| Error::not_found("Webhook", &webhook.sys.id))
    }
}

impl Backend for MemoryBackend {
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
