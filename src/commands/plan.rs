//! Work out what `apply` will do.
//!
//! No attributes are compared here. Every declared resource that is already
//! recorded is handed to the driver's update, which reads the remote copy
//! and only writes what drifted.

use crate::Context;
use crate::manifest::Manifest;
use crate::state::{ResourceRecord, SyncState};
use crate::ui;
use anyhow::Result;
use colored::{ColoredString, Colorize};
use reconcile::DesiredResource;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Declared but not recorded
    Create {
        address: String,
        desired: DesiredResource,
    },
    /// Declared and recorded
    Update {
        address: String,
        id: String,
        desired: DesiredResource,
    },
    /// Recorded under a kind, location or ID the declaration no longer matches
    Replace {
        address: String,
        record: ResourceRecord,
        desired: DesiredResource,
    },
    /// Recorded but no longer declared
    Delete {
        address: String,
        record: ResourceRecord,
    },
}

impl Action {
    pub fn address(&self) -> &str {
        match self {
            Self::Create { address, .. }
            | Self::Update { address, .. }
            | Self::Replace { address, .. }
            | Self::Delete { address, .. } => address,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Replace { .. } => "replace",
            Self::Delete { .. } => "delete",
        }
    }

    fn symbol(&self) -> ColoredString {
        match self {
            Self::Create { .. } => "+".green(),
            Self::Update { .. } => "~".yellow(),
            Self::Replace { .. } => "±".magenta(),
            Self::Delete { .. } => "-".red(),
        }
    }
}

/// A recorded resource has to be recreated when it no longer sits where the
/// declaration says, or was created under a different explicit ID.
fn needs_replacement(record: &ResourceRecord, desired: &DesiredResource) -> bool {
    record.kind != desired.kind()
        || record.locator != desired.locator()
        || desired.explicit_id().is_some_and(|id| id != record.id)
}

/// Records in the order they can be deleted: webhooks, then entries, then
/// the content types the entries depend on.
pub fn deletion_order<'a>(
    records: impl IntoIterator<Item = (&'a String, &'a ResourceRecord)>,
) -> Vec<(String, ResourceRecord)> {
    let mut records: Vec<_> = records
        .into_iter()
        .map(|(address, record)| (address.clone(), record.clone()))
        .collect();
    records.sort_by(|a, b| b.1.kind.cmp(&a.1.kind).then_with(|| a.0.cmp(&b.0)));
    records
}

/// Deletions first, then creates and updates in manifest order.
pub fn compute(manifest: &Manifest, state: &SyncState) -> Vec<Action> {
    let orphans = state
        .resources
        .iter()
        .filter(|(address, _)| manifest.get(address).is_none());

    let mut actions: Vec<Action> = deletion_order(orphans)
        .into_iter()
        .map(|(address, record)| Action::Delete { address, record })
        .collect();

    for declared in &manifest.resources {
        let address = declared.address.clone();
        let desired = declared.resource.clone();
        let action = match state.get(&declared.address) {
            None => Action::Create { address, desired },
            Some(record) if needs_replacement(record, &declared.resource) => Action::Replace {
                address,
                record: record.clone(),
                desired,
            },
            Some(record) => Action::Update {
                address,
                id: record.id.clone(),
                desired,
            },
        };
        actions.push(action);
    }

    actions
}

/// Print the plan, one line per address
pub fn print(actions: &[Action]) {
    ui::header("Plan");
    for action in actions {
        let detail = match action {
            Action::Create { desired, .. } => format!("in {}", desired.locator()),
            Action::Update { id, .. } => format!("id {id}"),
            Action::Replace { record, desired, .. } => {
                format!("id {} in {} → {}", record.id, record.locator, desired.locator())
            }
            Action::Delete { record, .. } => format!("id {} in {}", record.id, record.locator),
        };
        println!("  {} {} {}", action.symbol(), action.address(), detail.dimmed());
    }

    let count = |verb: &str| actions.iter().filter(|a| a.verb() == verb).count();
    println!();
    println!(
        "{} {} to create, {} to update, {} to replace, {} to delete",
        "Plan:".bold(),
        count("create"),
        count("update"),
        count("replace"),
        count("delete"),
    );
}

pub fn run(ctx: &Context) -> Result<()> {
    let manifest = Manifest::load(&ctx.manifest_path)?;
    let state = SyncState::load(&ctx.state_path)?;
    let actions = compute(&manifest, &state);

    if actions.is_empty() {
        ui::success("Nothing is declared or recorded");
        return Ok(());
    }
    print(&actions);

    let partial: Vec<_> = state
        .resources
        .iter()
        .filter(|(_, record)| record.partial)
        .map(|(address, _)| address.as_str())
        .collect();
    if !partial.is_empty() && !ctx.quiet {
        println!();
        ui::warn(&format!(
            "Last apply left {} unfinished: {}",
            ui::plural(partial.len(), "resource", "resources"),
            partial.join(", ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::SITE;
    use chrono::Utc;
    use reconcile::{Locator, ResourceKind, StoredAttributes, WebhookState};
    use std::collections::BTreeMap;

    fn record(kind: ResourceKind, id: &str, locator: Locator) -> ResourceRecord {
        ResourceRecord {
            kind,
            id: id.into(),
            locator,
            attributes: StoredAttributes::Webhook(WebhookState {
                space_id: "sp1".into(),
                version: 1,
                name: "n".into(),
                url: "u".into(),
                http_basic_auth_username: None,
                headers: BTreeMap::new(),
                topics: vec![],
            }),
            partial: false,
            applied_at: Utc::now(),
        }
    }

    fn verbs(actions: &[Action]) -> Vec<(&str, &str)> {
        actions.iter().map(|a| (a.verb(), a.address())).collect()
    }

    #[test]
    fn test_everything_new() {
        let manifest = Manifest::parse(SITE).unwrap();
        let actions = compute(&manifest, &SyncState::default());
        assert_eq!(
            verbs(&actions),
            [
                ("create", "content_type.post"),
                ("create", "entry.hello"),
                ("create", "webhook.notify"),
            ]
        );
    }

    #[test]
    fn test_recorded_are_updated_and_orphans_deleted() {
        let manifest = Manifest::parse(SITE).unwrap();
        let env = Locator::environment("sp1", "master");
        let mut state = SyncState::default();
        state.resources.insert(
            "content_type.post".into(),
            record(ResourceKind::ContentType, "blogPost", env.clone()),
        );
        state.resources.insert(
            "content_type.old".into(),
            record(ResourceKind::ContentType, "old", env.clone()),
        );
        state
            .resources
            .insert("entry.old".into(), record(ResourceKind::Entry, "e-old", env));
        state.resources.insert(
            "webhook.notify".into(),
            record(ResourceKind::Webhook, "wh1", Locator::space("sp1")),
        );

        let actions = compute(&manifest, &state);
        assert_eq!(
            verbs(&actions),
            [
                ("delete", "entry.old"),
                ("delete", "content_type.old"),
                ("update", "content_type.post"),
                ("create", "entry.hello"),
                ("update", "webhook.notify"),
            ]
        );
        let Action::Update { id, .. } = &actions[4] else {
            panic!("expected update");
        };
        assert_eq!(id, "wh1");
    }

    #[test]
    fn test_moved_resource_is_replaced() {
        let manifest = Manifest::parse(SITE).unwrap();
        let mut state = SyncState::default();
        state.resources.insert(
            "entry.hello".into(),
            record(ResourceKind::Entry, "hello", Locator::environment("sp1", "staging")),
        );
        state.resources.insert(
            "content_type.post".into(),
            record(
                ResourceKind::ContentType,
                "renamedPost",
                Locator::environment("sp1", "master"),
            ),
        );

        let actions = compute(&manifest, &state);
        assert_eq!(actions[0].verb(), "replace");
        assert_eq!(actions[0].address(), "content_type.post");
        assert_eq!(actions[1].verb(), "replace");
        assert_eq!(actions[1].address(), "entry.hello");
    }

    #[test]
    fn test_deletion_order() {
        let env = Locator::environment("sp1", "master");
        let mut resources = BTreeMap::new();
        resources.insert("a".to_string(), record(ResourceKind::ContentType, "1", env.clone()));
        resources.insert("b".to_string(), record(ResourceKind::Webhook, "2", Locator::space("sp1")));
        resources.insert("c".to_string(), record(ResourceKind::Entry, "3", env));

        let order: Vec<_> = deletion_order(&resources)
            .into_iter()
            .map(|(address, _)| address)
            .collect();
        assert_eq!(order, ["b", "c", "a"]);
    }
}
