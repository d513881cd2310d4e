//! `cmsync apply`: drive every planned action and record the outcome.

use super::plan::{self, Action};
use crate::Context;
use crate::cli::ApplyArgs;
use crate::manifest::Manifest;
use crate::state::{ResourceRecord, SyncState};
use crate::ui;
use anyhow::{Result, bail};
use cmakit::CallContext;
use cmakit::backend::Backend;
use reconcile::{Applied, DesiredResource, Driver, OpResult, ReconcileContext};
use std::path::Path;

/// How a single action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Done,
    /// The resource exists but did not reach its declared state
    Partial,
    Failed,
}

/// Counts of what an apply run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub deleted: usize,
    pub partial: usize,
    pub failed: usize,
    /// Actions not attempted because the run was interrupted
    pub skipped: usize,
}

impl ApplySummary {
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.replaced + self.deleted
    }

    pub fn is_success(&self) -> bool {
        self.partial == 0 && self.failed == 0 && self.skipped == 0
    }

    fn tally(&mut self, action: &Action, outcome: Outcome) {
        match outcome {
            Outcome::Failed => self.failed += 1,
            Outcome::Partial => self.partial += 1,
            Outcome::Done => match action {
                Action::Create { .. } => self.created += 1,
                Action::Update { .. } => self.updated += 1,
                Action::Replace { .. } => self.replaced += 1,
                Action::Delete { .. } => self.deleted += 1,
            },
        }
    }
}

/// Record a create or update result. A failed update keeps the old record.
fn settle(
    state: &mut SyncState,
    address: &str,
    desired: &DesiredResource,
    result: OpResult<Applied>,
) -> Outcome {
    match result {
        Ok(applied) => {
            ui::diagnostics(&applied.diagnostics);
            state.record(address, desired, &applied);
            if applied.is_partial() {
                Outcome::Partial
            } else {
                Outcome::Done
            }
        }
        Err(diagnostics) => {
            ui::diagnostics(&diagnostics);
            Outcome::Failed
        }
    }
}

/// Delete a recorded resource. A failed delete keeps the record.
pub(super) fn remove(
    driver: &Driver<'_>,
    state: &mut SyncState,
    address: &str,
    record: &ResourceRecord,
) -> bool {
    match driver.delete(record.kind, &record.locator, &record.id) {
        Ok(()) => {
            state.forget(address);
            true
        }
        Err(diagnostics) => {
            ui::diagnostics(&diagnostics);
            false
        }
    }
}

fn perform(driver: &Driver<'_>, state: &mut SyncState, action: &Action) -> Outcome {
    match action {
        Action::Create { address, desired } => {
            settle(state, address, desired, driver.create(desired))
        }
        Action::Update {
            address,
            id,
            desired,
        } => settle(state, address, desired, driver.update(id, desired)),
        Action::Replace {
            address,
            record,
            desired,
        } => {
            if remove(driver, state, address, record) {
                settle(state, address, desired, driver.create(desired))
            } else {
                Outcome::Failed
            }
        }
        Action::Delete { address, record } => {
            if remove(driver, state, address, record) {
                Outcome::Done
            } else {
                Outcome::Failed
            }
        }
    }
}

/// Run every action in order, saving state after each one.
pub fn execute(
    backend: &dyn Backend,
    call: CallContext,
    actions: &[Action],
    state: &mut SyncState,
    state_path: &Path,
) -> Result<ApplySummary> {
    let driver = Driver::new(ReconcileContext::with_call(backend, call));
    let mut summary = ApplySummary::default();
    let total = actions.len();

    for (index, action) in actions.iter().enumerate() {
        if driver.context().call().is_cancelled() {
            summary.skipped = total - index;
            ui::warn(&format!(
                "Interrupted, {} not attempted",
                ui::plural(summary.skipped, "change", "changes")
            ));
            break;
        }

        ui::step(index + 1, total, &format!("{} {}", action.verb(), action.address()));
        let outcome = perform(&driver, state, action);
        log::debug!("{} {} ended {outcome:?}", action.verb(), action.address());
        summary.tally(action, outcome);

        state.save(state_path)?;
    }

    Ok(summary)
}

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let manifest = Manifest::load(&ctx.manifest_path)?;
    let mut state = SyncState::load(&ctx.state_path)?;
    let actions = plan::compute(&manifest, &state);

    if actions.is_empty() {
        ui::success("Nothing to apply");
        return Ok(());
    }

    if !ctx.quiet {
        plan::print(&actions);
        println!();
    }

    if args.dry_run {
        ui::info("Dry run - no changes made");
        return Ok(());
    }

    if !args.yes && !super::confirm("Apply these changes?", true)? {
        ui::info("Cancelled");
        return Ok(());
    }

    let (client, call) = super::connect(ctx)?;
    let summary = execute(&client, call, &actions, &mut state, &ctx.state_path)?;

    println!();
    if summary.total_changes() > 0 {
        ui::success(&format!(
            "Applied: {} created, {} updated, {} replaced, {} deleted",
            summary.created, summary.updated, summary.replaced, summary.deleted
        ));
    }
    if summary.partial > 0 {
        ui::warn(&format!(
            "{} left unfinished, run apply again to converge",
            ui::plural(summary.partial, "resource", "resources")
        ));
    }

    if !summary.is_success() {
        bail!(
            "{} failed, {} partial, {} skipped",
            ui::plural(summary.failed, "resource", "resources"),
            summary.partial,
            summary.skipped
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{SITE, backend};
    use cmakit::Environment;
    use cmakit::backend::memory::Op;
    use tempfile::TempDir;

    fn apply(
        backend: &dyn Backend,
        manifest: &Manifest,
        state: &mut SyncState,
        path: &Path,
    ) -> ApplySummary {
        let actions = plan::compute(manifest, state);
        execute(backend, CallContext::new(), &actions, state, path).unwrap()
    }

    #[test]
    fn test_apply_creates_and_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let backend = backend();
        let manifest = Manifest::parse(SITE).unwrap();
        let mut state = SyncState::default();

        let summary = apply(&backend, &manifest, &mut state, &path);
        assert!(summary.is_success(), "{summary:?}");
        assert_eq!(summary.created, 3);

        let env = Environment::new("sp1", "master");
        let entry = backend.entry(&env, "hello").unwrap();
        assert!(entry.sys.is_published());
        assert_eq!(entry.fields["views"]["en-US"], 42);

        let saved = SyncState::load(&path).unwrap();
        assert_eq!(saved, state);
        assert_eq!(saved.get("entry.hello").unwrap().id, "hello");
        assert_eq!(saved.get("content_type.post").unwrap().id, "blogPost");
        assert_eq!(saved.get("webhook.notify").unwrap().id, "gen1");
    }

    #[test]
    fn test_second_apply_converges_without_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let backend = backend();
        let manifest = Manifest::parse(SITE).unwrap();
        let mut state = SyncState::default();
        apply(&backend, &manifest, &mut state, &path);
        backend.clear_calls();

        let summary = apply(&backend, &manifest, &mut state, &path);
        assert!(summary.is_success());
        assert_eq!(summary.updated, 3);
        assert_eq!(backend.count(Op::UpsertEntry), 0);
        assert_eq!(backend.count(Op::Publish), 0);
        assert_eq!(backend.count(Op::UpsertContentType), 0);
        assert_eq!(backend.count(Op::Activate), 0);
        assert_eq!(backend.count(Op::UpsertWebhook), 0);
        assert_eq!(state.get("webhook.notify").unwrap().attributes.version(), 1);
    }

    #[test]
    fn test_removed_declaration_is_deleted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let backend = backend();
        let mut state = SyncState::default();
        apply(&backend, &Manifest::parse(SITE).unwrap(), &mut state, &path);

        let summary = apply(&backend, &Manifest::default(), &mut state, &path);
        assert!(summary.is_success());
        assert_eq!(summary.deleted, 3);
        assert!(state.resources.is_empty());
        assert!(backend.webhook("sp1", "gen1").is_none());
        assert!(backend.entry(&Environment::new("sp1", "master"), "hello").is_none());
    }

    #[test]
    fn test_partial_create_keeps_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let backend = backend();
        let mut state = SyncState::default();
        backend.fail_next(
            Op::Publish,
            cmakit::Error::Validation {
                message: "title is required".into(),
            },
        );

        let summary = apply(&backend, &Manifest::parse(SITE).unwrap(), &mut state, &path);
        assert!(!summary.is_success());
        assert_eq!(summary.partial, 1);
        assert_eq!(summary.created, 2);

        let record = SyncState::load(&path).unwrap().get("entry.hello").cloned().unwrap();
        assert_eq!(record.id, "hello");
        assert!(record.partial);
    }

    #[test]
    fn test_failed_create_records_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let backend = backend();
        let mut state = SyncState::default();
        backend.fail_next(
            Op::UpsertWebhook,
            cmakit::Error::Transport {
                message: "connection reset".into(),
            },
        );

        let summary = apply(&backend, &Manifest::parse(SITE).unwrap(), &mut state, &path);
        assert_eq!(summary.failed, 1);
        assert!(state.get("webhook.notify").is_none());
        assert!(state.get("entry.hello").is_some());
    }

    #[test]
    fn test_interrupted_run_skips_the_rest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let backend = backend();
        let manifest = Manifest::parse(SITE).unwrap();
        let mut state = SyncState::default();
        let actions = plan::compute(&manifest, &state);
        let call = CallContext::new();
        call.cancel();

        let summary = execute(&backend, call, &actions, &mut state, &path).unwrap();
        assert_eq!(summary.skipped, 3);
        assert!(!summary.is_success());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_replace_moves_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let backend = backend().with_environment("sp1", "staging");
        let mut state = SyncState::default();
        apply(&backend, &Manifest::parse(SITE).unwrap(), &mut state, &path);

        let moved = SITE.replacen(
            "key = \"hello\"",
            "key = \"hello\"\nenv_id = \"staging\"",
            1,
        );
        let summary = apply(&backend, &Manifest::parse(&moved).unwrap(), &mut state, &path);
        assert!(summary.is_success(), "{summary:?}");
        assert_eq!(summary.replaced, 1);
        assert!(backend.entry(&Environment::new("sp1", "master"), "hello").is_none());
        assert!(backend.entry(&Environment::new("sp1", "staging"), "hello").is_some());
        assert_eq!(
            state.get("entry.hello").unwrap().locator.env_id.as_deref(),
            Some("staging")
        );
    }
}
