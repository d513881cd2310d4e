//! `cmsync destroy`: delete everything the state file records.

use super::apply::remove;
use super::plan::deletion_order;
use crate::Context;
use crate::cli::DestroyArgs;
use crate::state::SyncState;
use crate::ui;
use anyhow::{Result, bail};
use cmakit::CallContext;
use cmakit::backend::Backend;
use reconcile::{Driver, ReconcileContext};
use std::path::Path;

/// Delete every recorded resource, saving state after each one.
///
/// Returns the addresses that were not deleted; they stay in state.
pub fn execute(
    backend: &dyn Backend,
    call: CallContext,
    state: &mut SyncState,
    state_path: &Path,
) -> Result<Vec<String>> {
    let driver = Driver::new(ReconcileContext::with_call(backend, call));
    let mut pending = deletion_order(&state.resources).into_iter().enumerate();
    let total = pending.len();
    let mut failed = Vec::new();

    while let Some((index, (address, record))) = pending.next() {
        if driver.context().call().is_cancelled() {
            ui::warn("Interrupted, remaining resources kept");
            failed.push(address);
            failed.extend(pending.map(|(_, (address, _))| address));
            break;
        }

        ui::step(index + 1, total, &format!("delete {address}"));
        if !remove(&driver, state, &address, &record) {
            failed.push(address);
        }
        state.save(state_path)?;
    }

    Ok(failed)
}

pub fn run(ctx: &Context, args: DestroyArgs) -> Result<()> {
    let mut state = SyncState::load(&ctx.state_path)?;
    if state.resources.is_empty() {
        ui::success("Nothing to destroy");
        return Ok(());
    }

    if !ctx.quiet {
        ui::header("Destroy");
        for (address, record) in deletion_order(&state.resources) {
            ui::dim(&format!("- {address} ({} in {})", record.id, record.locator));
        }
        println!();
    }

    let prompt = format!(
        "Delete {}?",
        ui::plural(state.resources.len(), "resource", "resources")
    );
    if !args.yes && !super::confirm(&prompt, false)? {
        ui::info("Cancelled");
        return Ok(());
    }

    let (client, call) = super::connect(ctx)?;
    let failed = execute(&client, call, &mut state, &ctx.state_path)?;

    if !failed.is_empty() {
        bail!("Could not delete: {}", failed.join(", "));
    }
    ui::success("All recorded resources deleted");
    Ok(())
}
