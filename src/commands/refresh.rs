//! `cmsync refresh`: re-read every recorded resource.

use crate::Context;
use crate::state::SyncState;
use crate::ui;
use anyhow::{Result, bail};
use cmakit::CallContext;
use cmakit::backend::Backend;
use reconcile::{Driver, ReadOutcome, ReconcileContext};
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub present: usize,
    /// Gone on the server and dropped from state
    pub dropped: usize,
    pub failed: usize,
}

pub fn execute(
    backend: &dyn Backend,
    call: CallContext,
    state: &mut SyncState,
    state_path: &Path,
) -> Result<RefreshSummary> {
    let driver = Driver::new(ReconcileContext::with_call(backend, call));
    let mut summary = RefreshSummary::default();
    let records: Vec<_> = state
        .resources
        .iter()
        .map(|(address, record)| (address.clone(), record.clone()))
        .collect();

    for (address, record) in records {
        match driver.read(record.kind, &record.locator, &record.id) {
            Ok(ReadOutcome::Present(attributes)) => {
                state.refresh(&address, attributes);
                summary.present += 1;
            }
            Ok(ReadOutcome::Absent) => {
                ui::warn(&format!("{address} ({}) no longer exists", record.id));
                state.forget(&address);
                summary.dropped += 1;
            }
            Err(diagnostics) => {
                ui::error(&format!("Could not read {address}"));
                ui::diagnostics(&diagnostics);
                summary.failed += 1;
            }
        }
    }

    state.save(state_path)?;
    Ok(summary)
}

pub fn run(ctx: &Context) -> Result<()> {
    let mut state = SyncState::load(&ctx.state_path)?;
    if state.resources.is_empty() {
        ui::info("No resources recorded");
        return Ok(());
    }

    let (client, call) = super::connect(ctx)?;
    let summary = execute(&client, call, &mut state, &ctx.state_path)?;

    ui::success(&format!(
        "Refreshed {}, dropped {}",
        ui::plural(summary.present, "resource", "resources"),
        summary.dropped
    ));
    if summary.failed > 0 {
        bail!(
            "{} could not be read",
            ui::plural(summary.failed, "resource", "resources")
        );
    }
    Ok(())
}
