//! Driver trait for reconciling one resource kind
//!
//! A driver maps the four logical operations onto Management API calls and
//! turns every API error into diagnostics. Nothing here panics or aborts on a
//! remote failure; the host decides what a failed or partial result means.

use crate::context::ReconcileContext;
use crate::desired::{Locator, ResourceKind};
use crate::diagnostics::OpResult;
use crate::state::{Applied, ReadOutcome};

/// Core trait for reconciling a resource kind
///
/// Implementations exist for entries, webhooks and content types:
///
/// ```ignore
/// use reconcile::{EntryDriver, ReconcileContext, ResourceDriver};
///
/// let ctx = ReconcileContext::new(&client);
/// let applied = EntryDriver.create(&ctx, &spec)?;
/// // later, with the ID the host persisted
/// let outcome = EntryDriver.read(&ctx, &spec.locator(), &applied.id)?;
/// ```
pub trait ResourceDriver {
    /// Declared shape this driver consumes
    type Spec;

    /// Resource kind handled by this driver
    fn kind(&self) -> ResourceKind;

    /// Create the resource and bring its lifecycle to the declared state
    ///
    /// The write goes out without a prior version; the server assigns an ID
    /// unless the declaration names one. If a follow-up call fails after the
    /// write succeeded, the result still carries the new ID together with
    /// the error diagnostics.
    fn create(&self, ctx: &ReconcileContext<'_>, spec: &Self::Spec) -> OpResult<Applied>;

    /// Read the current stored attributes
    ///
    /// A resource that no longer exists remotely is not an error: it reads as
    /// [`ReadOutcome::Absent`] and the host should forget its ID.
    fn read(&self, ctx: &ReconcileContext<'_>, locator: &Locator, id: &str)
    -> OpResult<ReadOutcome>;

    /// Update an existing resource
    ///
    /// The remote object is fetched first so the write carries its current
    /// version and keeps server-owned fields. A version mismatch is reported,
    /// never retried.
    fn update(&self, ctx: &ReconcileContext<'_>, id: &str, spec: &Self::Spec)
    -> OpResult<Applied>;

    /// Delete the resource
    ///
    /// Deleting something already gone succeeds with no diagnostics. Any
    /// other failure is reported and the host keeps the resource so a retry
    /// is possible.
    fn delete(&self, ctx: &ReconcileContext<'_>, locator: &Locator, id: &str) -> OpResult<()>;
}
