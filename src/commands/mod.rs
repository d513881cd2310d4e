//! Command implementations.
//!
//! Each command splits into a `run` that deals with files, prompts and the
//! network, and an `execute` that works against any
//! [`Backend`](cmakit::backend::Backend) so it can be
//! tested with the in-memory one.

pub mod apply;
pub mod destroy;
pub mod plan;
pub mod refresh;

use crate::Context;
use anyhow::Result;
use cmakit::{CallContext, Client};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Connect to the Management API and make Ctrl+C cancel in-flight work.
///
/// An interrupted run stops between API calls; whatever was already applied
/// stays applied and is recorded in the state file.
pub fn connect(ctx: &Context) -> Result<(Client, CallContext)> {
    let client = Client::new(&ctx.client_config()?);

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(err) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        log::debug!("Could not install Ctrl+C handler: {err}");
    }

    Ok((client, CallContext::with_flag(interrupted)))
}

/// Ask before touching the space.
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?;

    Ok(confirmed)
}
