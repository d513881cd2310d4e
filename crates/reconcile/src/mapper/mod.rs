//! Translation between declared and remote shapes.
//!
//! Each resource kind gets three pure functions:
//! - `to_remote` builds the outbound payload from a declaration
//! - `overlay` writes a declaration onto a fetched remote object, keeping its `sys`
//! - `from_remote` extracts the attributes the host persists
//!
//! `from_remote` is deterministic: applying it twice to the same remote object
//! yields identical stored attributes.

pub mod content_type;
pub mod entry;
pub mod webhook;
