//! Cancellation-aware call context.
//!
//! A [`CallContext`] is threaded through every API call. Cancelling it makes
//! each subsequent call fail with [`Error::Cancelled`] before any request is
//! sent; calls that already completed are not rolled back.

use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation signal for one or more API calls.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancelled: Arc<AtomicBool>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned flag, e.g. one set from a Ctrl+C handler.
    pub fn with_flag(cancelled: Arc<AtomicBool>) -> Self {
        Self { cancelled }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Cancelled`] once cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
