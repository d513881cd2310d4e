//! Reconciliation drivers.
//!
//! One [`ResourceDriver`] per resource kind, plus [`Driver`], which dispatches
//! a [`DesiredResource`] to the right one.

mod content_type;
mod entry;
mod webhook;

pub use content_type::ContentTypeDriver;
pub use entry::EntryDriver;
pub use webhook::WebhookDriver;

use crate::context::ReconcileContext;
use crate::desired::{DesiredResource, Locator, ResourceKind};
use crate::diagnostics::OpResult;
use crate::resource::ResourceDriver;
use crate::state::{Applied, ReadOutcome};

/// Turn a NotFound into `None`; every other error passes through.
fn found<T>(result: cmakit::Result<T>) -> cmakit::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Dispatches operations on any resource kind.
///
/// Built once per process around a [`ReconcileContext`].
pub struct Driver<'a> {
    ctx: ReconcileContext<'a>,
}

impl<'a> Driver<'a> {
    pub fn new(ctx: ReconcileContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ReconcileContext<'a> {
        &self.ctx
    }

    pub fn create(&self, desired: &DesiredResource) -> OpResult<Applied> {
        log::debug!("Creating {} in {}", desired.kind(), desired.locator());
        match desired {
            DesiredResource::ContentType(spec) => ContentTypeDriver.create(&self.ctx, spec),
            DesiredResource::Entry(spec) => EntryDriver.create(&self.ctx, spec),
            DesiredResource::Webhook(spec) => WebhookDriver.create(&self.ctx, spec),
        }
    }

    pub fn read(&self, kind: ResourceKind, locator: &Locator, id: &str) -> OpResult<ReadOutcome> {
        log::debug!("Reading {kind} {id} in {locator}");
        match kind {
            ResourceKind::ContentType => ContentTypeDriver.read(&self.ctx, locator, id),
            ResourceKind::Entry => EntryDriver.read(&self.ctx, locator, id),
            ResourceKind::Webhook => WebhookDriver.read(&self.ctx, locator, id),
        }
    }

    pub fn update(&self, id: &str, desired: &DesiredResource) -> OpResult<Applied> {
        log::debug!("Updating {} {id} in {}", desired.kind(), desired.locator());
        match desired {
            DesiredResource::ContentType(spec) => ContentTypeDriver.update(&self.ctx, id, spec),
            DesiredResource::Entry(spec) => EntryDriver.update(&self.ctx, id, spec),
            DesiredResource::Webhook(spec) => WebhookDriver.update(&self.ctx, id, spec),
        }
    }

    pub fn delete(&self, kind: ResourceKind, locator: &Locator, id: &str) -> OpResult<()> {
        log::debug!("Deleting {kind} {id} in {locator}");
        match kind {
            ResourceKind::ContentType => ContentTypeDriver.delete(&self.ctx, locator, id),
            ResourceKind::Entry => EntryDriver.delete(&self.ctx, locator, id),
            ResourceKind::Webhook => WebhookDriver.delete(&self.ctx, locator, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{backend, content_type_spec, entry_spec, env, webhook_spec};
    use cmakit::CallContext;
    use cmakit::backend::memory::Op;

    #[test]
    fn test_found() {
        assert_eq!(found(Ok(1)).unwrap(), Some(1));
        assert_eq!(found::<u8>(Err(cmakit::Error::not_found("Entry", "e1"))).unwrap(), None);
        assert!(found::<u8>(Err(cmakit::Error::Cancelled)).is_err());
    }

    #[test]
    fn test_kinds() {
        assert_eq!(EntryDriver.kind(), ResourceKind::Entry);
        assert_eq!(WebhookDriver.kind(), ResourceKind::Webhook);
        assert_eq!(ContentTypeDriver.kind(), ResourceKind::ContentType);
    }

    #[test]
    fn test_full_lifecycle_through_facade() {
        let backend = backend();
        let driver = Driver::new(ReconcileContext::new(&backend));

        let resources = [
            DesiredResource::ContentType(content_type_spec()),
            DesiredResource::Entry(entry_spec()),
            DesiredResource::Webhook(webhook_spec()),
        ];

        for desired in &resources {
            let applied = driver.create(desired).unwrap();
            assert!(!applied.is_partial());
            assert_eq!(applied.state.kind(), desired.kind());

            let outcome = driver.read(desired.kind(), &desired.locator(), &applied.id).unwrap();
            assert_eq!(outcome, ReadOutcome::Present(applied.state.clone()));

            let updated = driver.update(&applied.id, desired).unwrap();
            assert!(!updated.is_partial());

            driver.delete(desired.kind(), &desired.locator(), &applied.id).unwrap();
            let outcome = driver.read(desired.kind(), &desired.locator(), &applied.id).unwrap();
            assert!(outcome.is_absent());
        }
    }

    #[test]
    fn test_cancellation_stops_before_any_call() {
        let backend = backend();
        let call = CallContext::new();
        let driver = Driver::new(ReconcileContext::with_call(&backend, call.clone()));
        call.cancel();

        let diags = driver.create(&DesiredResource::Entry(entry_spec())).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_interrupted_lifecycle_is_not_rolled_back() {
        let backend = backend();
        let driver = Driver::new(ReconcileContext::new(&backend));
        backend.fail_next(Op::Publish, cmakit::Error::Cancelled);
        let mut spec = entry_spec();
        spec.published = true;

        let applied = driver.create(&DesiredResource::Entry(spec)).unwrap();
        assert!(applied.is_partial());
        assert_eq!(applied.id, "hello");
        assert!(backend.entry(&env(), "hello").is_some());
        assert_eq!(backend.count(Op::DeleteEntry), 0);
    }
}
