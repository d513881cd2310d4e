//! Entry lifecycle synchronization.
//!
//! An entry sits somewhere in {unpublished, published} x {unarchived, archived}.
//! Both flags are derived from `sys` timestamps on every pass, never stored.
//! [`plan`] computes the minimal list of transitions toward the declared flags
//! and [`synchronize`] issues them, collecting every failure instead of
//! keeping only the last one.

use crate::context::Scope;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Error;
use cmakit::backend::Entries;
use cmakit::{Entry, Sys};
use std::fmt;

/// Published and archived flags of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleFlags {
    pub published: bool,
    pub archived: bool,
}

impl LifecycleFlags {
    pub fn new(published: bool, archived: bool) -> Self {
        Self {
            published,
            archived,
        }
    }

    /// Flags of a remote object, from its timestamps.
    pub fn of(sys: &Sys) -> Self {
        Self::new(sys.is_published(), sys.is_archived())
    }

    /// Target actually pursued: an archived entry cannot be published, so
    /// archiving wins when both are requested.
    pub fn effective(self) -> Self {
        Self::new(self.published && !self.archived, self.archived)
    }
}

/// A single lifecycle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unarchive,
    Publish,
    Unpublish,
    Archive,
}

impl Transition {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Unarchive => "unarchive",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Archive => "archive",
        }
    }

    fn call(&self, entries: &dyn Entries, scope: &Scope<'_>, entry: &Entry) -> cmakit::Result<Entry> {
        match self {
            Self::Unarchive => entries.unarchive(scope.call, &scope.env, entry),
            Self::Publish => entries.publish(scope.call, &scope.env, entry),
            Self::Unpublish => entries.unpublish(scope.call, &scope.env, entry),
            Self::Archive => entries.archive(scope.call, &scope.env, entry),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Transitions that move `current` to `desired`, in the order they must run.
///
/// The server refuses to publish an archived entry and to archive a published
/// one, so unarchiving comes first and archiving last.
pub fn plan(current: LifecycleFlags, desired: LifecycleFlags) -> Vec<Transition> {
    let target = desired.effective();
    let mut transitions = Vec::new();

    if current.archived && !target.archived {
        transitions.push(Transition::Unarchive);
    }
    match (current.published, target.published) {
        (false, true) => transitions.push(Transition::Publish),
        (true, false) => transitions.push(Transition::Unpublish),
        _ => {}
    }
    if !current.archived && target.archived {
        transitions.push(Transition::Archive);
    }
    transitions
}

/// Outcome of [`synchronize`].
#[derive(Debug)]
pub struct SyncReport {
    /// Latest copy of the entry (as returned by the last successful call)
    pub entry: Entry,
    /// Transitions that went through
    pub applied: Vec<Transition>,
    /// Every failed transition, in call order
    pub errors: Vec<(Transition, Error)>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// One error diagnostic per failed transition.
    pub fn diagnostics(&self) -> Diagnostics {
        self.errors
            .iter()
            .map(|(transition, err)| {
                Diagnostic::failed(&format!("{transition} entry {}", self.entry.sys.id), err)
            })
            .collect()
    }
}

/// Drive the entry's lifecycle flags toward `desired`.
///
/// Every planned transition is attempted, each with the version returned by
/// the previous successful call. Failures are collected in order; a
/// cancellation stops the sequence where it is.
pub fn synchronize(
    entries: &dyn Entries,
    scope: &Scope<'_>,
    entry: Entry,
    desired: LifecycleFlags,
) -> SyncReport {
    let transitions = plan(LifecycleFlags::of(&entry.sys), desired);
    let mut report = SyncReport {
        entry,
        applied: Vec::new(),
        errors: Vec::new(),
    };

    for transition in transitions {
        log::debug!("Entry {}: {transition}", report.entry.sys.id);
        match transition.call(entries, scope, &report.entry) {
            Ok(updated) => {
                report.entry = updated;
                report.applied.push(transition);
            }
            Err(err) => {
                log::warn!("Failed to {transition} entry {}: {err}", report.entry.sys.id);
                let cancelled = matches!(err, cmakit::Error::Cancelled);
                report.errors.push((transition, err.into()));
                if cancelled {
                    break;
                }
            }
        }
    }
    report
}
