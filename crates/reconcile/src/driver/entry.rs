//! Entry driver.

use super::found;
use crate::context::{ReconcileContext, Scope};
use crate::desired::{EntrySpec, Locator, ResourceKind};
use crate::diagnostics::{Diagnostic, OpResult, failed};
use crate::lifecycle::{self, LifecycleFlags};
use crate::mapper::entry as mapper;
use crate::resource::ResourceDriver;
use crate::state::{Applied, ReadOutcome, StoredAttributes};
use cmakit::Entry;
use cmakit::backend::Entries;

/// Reconciles entries and their publish/archive state.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryDriver;

/// Run the synchronizer and package whatever the entry ended up as.
fn settle(entries: &dyn Entries, scope: &Scope<'_>, entry: Entry, spec: &EntrySpec) -> Applied {
    let desired = LifecycleFlags::new(spec.published, spec.archived);
    let report = lifecycle::synchronize(entries, scope, entry, desired);
    let mut diagnostics = report.diagnostics();
    if desired != desired.effective() {
        diagnostics.push(Diagnostic::warning(
            format!("Entry {} stays unpublished", report.entry.sys.id),
            "archived entries cannot be published; published = true is ignored",
        ));
    }
    let state = StoredAttributes::Entry(mapper::from_remote(&report.entry));
    Applied::new(report.entry.sys.id.clone(), state).with_diagnostics(diagnostics)
}

impl ResourceDriver for EntryDriver {
    type Spec = EntrySpec;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Entry
    }

    fn create(&self, ctx: &ReconcileContext<'_>, spec: &EntrySpec) -> OpResult<Applied> {
        spec.validate().map_err(failed("validate entry"))?;
        let entries = ctx.entries();

        ctx.with_environment(&spec.locator(), |scope| {
            let payload = mapper::to_remote(spec);
            let created = entries
                .upsert(scope.call, &scope.env, &spec.content_type_id, &payload)
                .map_err(failed("create entry"))?;
            log::info!("Created entry {}", created.sys.id);

            Ok(settle(entries, scope, created, spec))
        })
    }

    fn read(
        &self,
        ctx: &ReconcileContext<'_>,
        locator: &Locator,
        id: &str,
    ) -> OpResult<ReadOutcome> {
        let entries = ctx.entries();

        ctx.with_environment(locator, |scope| {
            let entry =
                found(entries.get(scope.call, &scope.env, id)).map_err(failed(format!("read entry {id}")))?;
            Ok(match entry {
                Some(entry) => ReadOutcome::Present(StoredAttributes::Entry(mapper::from_remote(&entry))),
                None => {
                    log::warn!("Entry {id} no longer exists, treating it as absent");
                    ReadOutcome::Absent
                }
            })
        })
    }

    fn update(&self, ctx: &ReconcileContext<'_>, id: &str, spec: &EntrySpec) -> OpResult<Applied> {
        spec.validate().map_err(failed(format!("validate entry {id}")))?;
        let entries = ctx.entries();

        ctx.with_environment(&spec.locator(), |scope| {
            let current = entries
                .get(scope.call, &scope.env, id)
                .map_err(failed(format!("read entry {id}")))?;

            let remote_type = current.sys.content_type_id();
            if !remote_type.is_empty() && remote_type != spec.content_type_id {
                return Err(Diagnostic::error(
                    format!("Cannot change the content type of entry {id}"),
                    format!(
                        "entry has content type {remote_type}, declared {}; recreate it instead",
                        spec.content_type_id
                    ),
                )
                .into());
            }

            let mut draft = current.clone();
            if !mapper::overlay(&mut draft, spec) {
                log::debug!("Entry {id} fields are up to date");
                return Ok(settle(entries, scope, current, spec));
            }

            // Archived entries are read-only
            if current.sys.is_archived() {
                draft = entries
                    .unarchive(scope.call, &scope.env, &current)
                    .map_err(failed(format!("unarchive entry {id}")))?;
                mapper::overlay(&mut draft, spec);
            }

            let updated = entries
                .upsert(scope.call, &scope.env, &spec.content_type_id, &draft)
                .map_err(failed(format!("update entry {id}")))?;
            log::info!(
                "Updated entry {id} to version {}",
                updated.sys.version.unwrap_or_default()
            );

            Ok(settle(entries, scope, updated, spec))
        })
    }

    fn delete(&self, ctx: &ReconcileContext<'_>, locator: &Locator, id: &str) -> OpResult<()> {
        let entries = ctx.entries();

        ctx.with_environment(locator, |scope| {
            let Some(entry) =
                found(entries.get(scope.call, &scope.env, id)).map_err(failed(format!("read entry {id}")))?
            else {
                log::info!("Entry {id} is already gone");
                return Ok(());
            };

            if entry.sys.is_published() {
                entries
                    .unpublish(scope.call, &scope.env, &entry)
                    .map_err(failed(format!("unpublish entry {id}")))?;
            }

            found(entries.delete(scope.call, &scope.env, id)).map_err(failed(format!("delete entry {id}")))?;
            log::info!("Deleted entry {id}");
            Ok(())
        })
    }
}
