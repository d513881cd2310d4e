//! Webhook driver. Webhooks are space scoped, so no environment is resolved.

use super::found;
use crate::context::ReconcileContext;
use crate::desired::{Locator, ResourceKind, WebhookSpec};
use crate::diagnostics::{OpResult, failed};
use crate::mapper::webhook as mapper;
use crate::resource::ResourceDriver;
use crate::state::{Applied, ReadOutcome, StoredAttributes};
use cmakit::Webhook;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookDriver;

fn applied(webhook: &Webhook) -> Applied {
    Applied::new(
        webhook.sys.id.clone(),
        StoredAttributes::Webhook(mapper::from_remote(webhook)),
    )
}

impl ResourceDriver for WebhookDriver {
    type Spec = WebhookSpec;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Webhook
    }

    fn create(&self, ctx: &ReconcileContext<'_>, spec: &WebhookSpec) -> OpResult<Applied> {
        spec.validate().map_err(failed("validate webhook"))?;

        let created = ctx
            .webhooks()
            .upsert(ctx.call(), &spec.space_id, &mapper::to_remote(spec))
            .map_err(failed(format!("create webhook {}", spec.name)))?;
        log::info!("Created webhook {} ({})", created.name, created.sys.id);
        Ok(applied(&created))
    }

    fn read(
        &self,
        ctx: &ReconcileContext<'_>,
        locator: &Locator,
        id: &str,
    ) -> OpResult<ReadOutcome> {
        let webhook = found(ctx.webhooks().get(ctx.call(), &locator.space_id, id))
            .map_err(failed(format!("read webhook {id}")))?;

        Ok(match webhook {
            Some(webhook) => {
                ReadOutcome::Present(StoredAttributes::Webhook(mapper::from_remote(&webhook)))
            }
            None => {
                log::warn!("Webhook {id} no longer exists, treating it as absent");
                ReadOutcome::Absent
            }
        })
    }

    fn update(&self, ctx: &ReconcileContext<'_>, id: &str, spec: &WebhookSpec) -> OpResult<Applied> {
        spec.validate().map_err(failed(format!("validate webhook {id}")))?;
        let webhooks = ctx.webhooks();

        let mut webhook = webhooks
            .get(ctx.call(), &spec.space_id, id)
            .map_err(failed(format!("read webhook {id}")))?;
        // The password is write-only: it rides along with other changes only
        if !mapper::overlay(&mut webhook, spec) {
            log::debug!("Webhook {id} has not drifted");
            return Ok(applied(&webhook));
        }

        let updated = webhooks
            .upsert(ctx.call(), &spec.space_id, &webhook)
            .map_err(failed(format!("update webhook {id}")))?;
        log::info!(
            "Updated webhook {id} to version {}",
            updated.sys.version.unwrap_or_default()
        );
        Ok(applied(&updated))
    }

    fn delete(&self, ctx: &ReconcileContext<'_>, locator: &Locator, id: &str) -> OpResult<()> {
        let webhooks = ctx.webhooks();

        let Some(webhook) = found(webhooks.get(ctx.call(), &locator.space_id, id))
            .map_err(failed(format!("read webhook {id}")))?
        else {
            log::info!("Webhook {id} is already gone");
            return Ok(());
        };

        found(webhooks.delete(ctx.call(), &locator.space_id, &webhook))
            .map_err(failed(format!("delete webhook {id}")))?;
        log::info!("Deleted webhook {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{backend, webhook_spec};
    use cmakit::backend::memory::Op;

    #[test]
    fn test_create_and_read() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);

        let created = WebhookDriver.create(&ctx, &webhook_spec()).unwrap();
        assert_eq!(created.id, "gen1");
        assert_eq!(backend.ops(), [Op::UpsertWebhook]);

        let stored = backend.webhook("sp1", "gen1").unwrap();
        assert_eq!(stored.http_basic_password.as_deref(), Some("password"));

        let outcome = WebhookDriver.read(&ctx, &Locator::space("sp1"), "gen1").unwrap();
        let ReadOutcome::Present(StoredAttributes::Webhook(state)) = outcome else {
            panic!("webhook should be present");
        };
        assert_eq!(state.version, 1);
        assert_eq!(state.name, "webhook-name");
        assert_eq!(state.http_basic_auth_username.as_deref(), Some("username"));
        assert_eq!(state.topics, ["Entry.create", "ContentType.create", "*.publish"]);
        assert_eq!(StoredAttributes::Webhook(state), created.state);
    }

    #[test]
    fn test_update_resends_password() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        let created = WebhookDriver.create(&ctx, &webhook_spec()).unwrap();

        let mut spec = webhook_spec();
        spec.headers.remove("Header2");
        spec.topics = vec!["Entry.delete".into()];
        let applied = WebhookDriver.update(&ctx, &created.id, &spec).unwrap();
        assert_eq!(applied.state.version(), 2);

        let stored = backend.webhook("sp1", &created.id).unwrap();
        assert_eq!(stored.headers.len(), 1);
        assert_eq!(stored.topics, ["Entry.delete"]);
        assert_eq!(stored.http_basic_password.as_deref(), Some("password"));
    }

    #[test]
    fn test_update_without_drift_makes_no_write() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        let created = WebhookDriver.create(&ctx, &webhook_spec()).unwrap();
        backend.clear_calls();

        let applied = WebhookDriver.update(&ctx, &created.id, &webhook_spec()).unwrap();
        assert_eq!(backend.ops(), [Op::GetWebhook]);
        assert_eq!(applied.state, created.state);
    }

    #[test]
    fn test_create_rejects_empty_topics() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        let mut spec = webhook_spec();
        spec.topics.clear();

        assert!(WebhookDriver.create(&ctx, &spec).is_err());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_delete_absent_makes_no_delete_call() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);

        let result = WebhookDriver.delete(&ctx, &Locator::space("sp1"), "gone");
        assert_eq!(result, Ok(()));
        assert_eq!(backend.count(Op::DeleteWebhook), 0);
        assert_eq!(backend.ops(), [Op::GetWebhook]);
    }

    #[test]
    fn test_delete() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        let created = WebhookDriver.create(&ctx, &webhook_spec()).unwrap();

        WebhookDriver.delete(&ctx, &Locator::space("sp1"), &created.id).unwrap();
        assert_eq!(backend.count(Op::DeleteWebhook), 1);
        assert!(backend.webhook("sp1", &created.id).is_none());
    }

    #[test]
    fn test_read_absent() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);

        let outcome = WebhookDriver.read(&ctx, &Locator::space("sp1"), "gone").unwrap();
        assert_eq!(outcome, ReadOutcome::Absent);
    }
}
