//! Content type driver.
//!
//! A schema change only takes effect once the content type is activated, so
//! every successful write is followed by an activation. An update that finds
//! nothing to change writes nothing. Fields dropped from
//! the declaration go through an intermediate omitted-and-activated version
//! first, because the server refuses to delete a field that is still active.

use super::found;
use crate::context::{ReconcileContext, Scope};
use crate::desired::{ContentTypeSpec, Locator, ResourceKind};
use crate::diagnostics::{OpResult, failed};
use crate::mapper::content_type as mapper;
use crate::resource::ResourceDriver;
use crate::state::{Applied, ReadOutcome, StoredAttributes};
use cmakit::ContentType;
use cmakit::backend::ContentTypes;

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTypeDriver;

fn stored(ct: &ContentType) -> StoredAttributes {
    StoredAttributes::ContentType(mapper::from_remote(ct))
}

/// Activate a freshly written schema. A failed activation leaves the write in place.
fn activate(content_types: &dyn ContentTypes, scope: &Scope<'_>, written: ContentType) -> Applied {
    let id = written.sys.id.clone();
    match content_types.activate(scope.call, &scope.env, &written) {
        Ok(active) => {
            log::debug!("Activated content type {id}");
            Applied::new(id, stored(&active))
        }
        Err(err) => {
            let diagnostics = failed(format!("activate content type {id}"))(err);
            Applied::new(id, stored(&written)).with_diagnostics(diagnostics)
        }
    }
}

impl ResourceDriver for ContentTypeDriver {
    type Spec = ContentTypeSpec;

    fn kind(&self) -> ResourceKind {
        ResourceKind::ContentType
    }

    fn create(&self, ctx: &ReconcileContext<'_>, spec: &ContentTypeSpec) -> OpResult<Applied> {
        spec.validate().map_err(failed("validate content type"))?;
        let content_types = ctx.content_types();

        ctx.with_environment(&spec.locator(), |scope| {
            let created = content_types
                .upsert(scope.call, &scope.env, &mapper::to_remote(spec))
                .map_err(failed(format!("create content type {}", spec.name)))?;
            log::info!("Created content type {} ({})", created.name, created.sys.id);

            Ok(activate(content_types, scope, created))
        })
    }

    fn read(
        &self,
        ctx: &ReconcileContext<'_>,
        locator: &Locator,
        id: &str,
    ) -> OpResult<ReadOutcome> {
        let content_types = ctx.content_types();

        ctx.with_environment(locator, |scope| {
            let ct = found(content_types.get(scope.call, &scope.env, id))
                .map_err(failed(format!("read content type {id}")))?;
            Ok(match ct {
                Some(ct) => ReadOutcome::Present(stored(&ct)),
                None => {
                    log::warn!("Content type {id} no longer exists, treating it as absent");
                    ReadOutcome::Absent
                }
            })
        })
    }

    fn update(
        &self,
        ctx: &ReconcileContext<'_>,
        id: &str,
        spec: &ContentTypeSpec,
    ) -> OpResult<Applied> {
        spec.validate().map_err(failed(format!("validate content type {id}")))?;
        let content_types = ctx.content_types();

        ctx.with_environment(&spec.locator(), |scope| {
            let mut current = content_types
                .get(scope.call, &scope.env, id)
                .map_err(failed(format!("read content type {id}")))?;

            let removed = mapper::removed_fields(&current, spec);
            let omitting = !removed.is_empty();
            if omitting {
                log::info!("Omitting fields {} of content type {id}", removed.join(", "));
                let omitted = mapper::omit(&current, &removed);
                let written = content_types
                    .upsert(scope.call, &scope.env, &omitted)
                    .map_err(failed(format!("omit fields of content type {id}")))?;
                current = content_types
                    .activate(scope.call, &scope.env, &written)
                    .map_err(failed(format!("activate content type {id}")))?;
            }

            if !mapper::overlay(&mut current, spec) && !omitting {
                if current.sys.has_draft_changes() {
                    log::info!("Content type {id} has an unactivated draft");
                    return Ok(activate(content_types, scope, current));
                }
                log::debug!("Content type {id} has not drifted");
                return Ok(Applied::new(id, stored(&current)));
            }

            let updated = content_types
                .upsert(scope.call, &scope.env, &current)
                .map_err(failed(format!("update content type {id}")))?;
            log::info!(
                "Updated content type {id} to version {}",
                updated.sys.version.unwrap_or_default()
            );

            Ok(activate(content_types, scope, updated))
        })
    }

    fn delete(&self, ctx: &ReconcileContext<'_>, locator: &Locator, id: &str) -> OpResult<()> {
        let content_types = ctx.content_types();

        ctx.with_environment(locator, |scope| {
            let Some(ct) = found(content_types.get(scope.call, &scope.env, id))
                .map_err(failed(format!("read content type {id}")))?
            else {
                log::info!("Content type {id} is already gone");
                return Ok(());
            };

            if ct.sys.is_published() {
                content_types
                    .deactivate(scope.call, &scope.env, &ct)
                    .map_err(failed(format!("deactivate content type {id}")))?;
            }

            found(content_types.delete(scope.call, &scope.env, id))
                .map_err(failed(format!("delete content type {id}")))?;
            log::info!("Deleted content type {id}");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{backend, content_type_spec, env};
    use cmakit::backend::memory::Op;

    #[test]
    fn test_create_activates() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);

        let applied = ContentTypeDriver.create(&ctx, &content_type_spec()).unwrap();
        assert_eq!(applied.id, "tf_test1");
        assert!(!applied.is_partial());
        assert_eq!(
            backend.ops(),
            [Op::GetEnvironment, Op::UpsertContentType, Op::Activate]
        );
        let StoredAttributes::ContentType(state) = &applied.state else {
            panic!("expected content type state");
        };
        assert_eq!(state.version, 2);
        assert_eq!(state.env_id, "master");
        assert_eq!(state.fields, content_type_spec().fields);
    }

    #[test]
    fn test_create_partial_when_activation_fails() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        backend.fail_next(
            Op::Activate,
            cmakit::Error::Validation {
                message: "display field must be a Symbol".into(),
            },
        );

        let applied = ContentTypeDriver.create(&ctx, &content_type_spec()).unwrap();
        assert!(applied.is_partial());
        assert_eq!(applied.id, "tf_test1");
        assert_eq!(applied.state.version(), 1);
    }

    #[test]
    fn test_update_changes_field() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        ContentTypeDriver.create(&ctx, &content_type_spec()).unwrap();
        backend.clear_calls();

        let mut spec = content_type_spec();
        spec.name = "tf_test_renamed".into();
        spec.fields[0].required = false;
        let applied = ContentTypeDriver.update(&ctx, "tf_test1", &spec).unwrap();

        assert!(!applied.is_partial());
        assert_eq!(
            backend.ops(),
            [Op::GetEnvironment, Op::GetContentType, Op::UpsertContentType, Op::Activate]
        );
        let stored = backend.content_type(&env(), "tf_test1").unwrap();
        assert_eq!(stored.name, "tf_test_renamed");
        assert!(!stored.fields[0].required);
    }

    #[test]
    fn test_update_without_drift_makes_no_write() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        let created = ContentTypeDriver.create(&ctx, &content_type_spec()).unwrap();
        backend.clear_calls();

        let applied = ContentTypeDriver
            .update(&ctx, "tf_test1", &content_type_spec())
            .unwrap();
        assert_eq!(backend.ops(), [Op::GetEnvironment, Op::GetContentType]);
        assert_eq!(applied.state, created.state);
    }

    #[test]
    fn test_update_activates_unchanged_draft() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        backend.fail_next(
            Op::Activate,
            cmakit::Error::Validation {
                message: "display field must be a Symbol".into(),
            },
        );
        assert!(ContentTypeDriver.create(&ctx, &content_type_spec()).unwrap().is_partial());
        backend.clear_calls();

        let applied = ContentTypeDriver
            .update(&ctx, "tf_test1", &content_type_spec())
            .unwrap();
        assert!(!applied.is_partial());
        assert_eq!(
            backend.ops(),
            [Op::GetEnvironment, Op::GetContentType, Op::Activate]
        );
        assert_eq!(applied.state.version(), 2);
    }

    #[test]
    fn test_update_omits_removed_fields_first() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        ContentTypeDriver.create(&ctx, &content_type_spec()).unwrap();
        backend.clear_calls();

        let mut spec = content_type_spec();
        spec.fields.truncate(2);
        let applied = ContentTypeDriver.update(&ctx, "tf_test1", &spec).unwrap();

        assert!(!applied.is_partial(), "{:?}", applied.diagnostics);
        assert_eq!(
            backend.ops(),
            [
                Op::GetEnvironment,
                Op::GetContentType,
                Op::UpsertContentType,
                Op::Activate,
                Op::UpsertContentType,
                Op::Activate,
            ]
        );
        let calls = backend.calls();
        assert_eq!(calls[2].payload.as_ref().unwrap()["fields"][2]["omitted"], true);
        assert_eq!(backend.content_type(&env(), "tf_test1").unwrap().fields.len(), 2);
    }

    #[test]
    fn test_update_missing_is_reported() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);

        let diags = ContentTypeDriver
            .update(&ctx, "tf_test1", &content_type_spec())
            .unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().summary, "Failed to read content type tf_test1");
    }

    #[test]
    fn test_delete_deactivates_first() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);
        ContentTypeDriver.create(&ctx, &content_type_spec()).unwrap();
        backend.clear_calls();

        ContentTypeDriver
            .delete(&ctx, &content_type_spec().locator(), "tf_test1")
            .unwrap();
        assert_eq!(
            backend.ops(),
            [Op::GetEnvironment, Op::GetContentType, Op::Deactivate, Op::DeleteContentType]
        );
        assert!(backend.content_type(&env(), "tf_test1").is_none());
    }

    #[test]
    fn test_delete_absent_is_success() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);

        ContentTypeDriver
            .delete(&ctx, &content_type_spec().locator(), "tf_test1")
            .unwrap();
        assert_eq!(backend.count(Op::DeleteContentType), 0);
    }
}
