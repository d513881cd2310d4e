//! Entry mapping.

use crate::desired::EntrySpec;
use crate::state::EntryState;
use crate::value::coerce;
use cmakit::{Entry, EntryFields, Sys};
use serde_json::Value;

/// Coerce and nest declared field values as `{field: {locale: value}}`.
///
/// Expects a validated spec; a repeated `(field, locale)` pair keeps the last value.
pub fn fields(spec: &EntrySpec) -> EntryFields {
    let mut fields = EntryFields::new();
    for field in &spec.fields {
        fields
            .entry(field.id.clone())
            .or_default()
            .insert(spec.locale_of(field).to_string(), coerce(&field.content).into());
    }
    fields
}

/// Build a new entry from a declaration.
pub fn to_remote(spec: &EntrySpec) -> Entry {
    Entry {
        sys: spec.entry_id.as_ref().map(Sys::with_id).unwrap_or_default(),
        fields: fields(spec),
        locale: spec.locale.clone(),
    }
}

/// JSON equality where numbers compare by value, so `3` and `3.0` match.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|(k, x)| ys.get(k).is_some_and(|y| same_value(x, y)))
        }
        _ => a == b,
    }
}

fn same_fields(a: &EntryFields, b: &EntryFields) -> bool {
    a.len() == b.len()
        && a.iter().all(|(field, locales)| {
            b.get(field).is_some_and(|other| {
                locales.len() == other.len()
                    && locales
                        .iter()
                        .all(|(locale, x)| other.get(locale).is_some_and(|y| same_value(x, y)))
            })
        })
}

/// Write the declared fields onto a fetched entry.
///
/// Returns whether anything changed.
pub fn overlay(remote: &mut Entry, spec: &EntrySpec) -> bool {
    let desired = fields(spec);
    remote.locale = spec.locale.clone();
    if same_fields(&remote.fields, &desired) {
        return false;
    }
    remote.fields = desired;
    true
}

pub fn from_remote(remote: &Entry) -> EntryState {
    EntryState {
        space_id: remote.sys.space_id().to_string(),
        version: remote.sys.version.unwrap_or_default(),
        content_type_id: remote.sys.content_type_id().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desired::FieldContent;
    use crate::testing::entry_spec;
    use cmakit::Link;
    use serde_json::json;

    #[test]
    fn test_payload_nests_by_field_then_locale() {
        let mut spec = entry_spec();
        spec.fields.push(FieldContent {
            id: "field1".into(),
            locale: Some("de-DE".into()),
            content: "hallo".into(),
        });

        let entry = to_remote(&spec);
        assert_eq!(entry.sys.id, "hello");
        assert_eq!(entry.sys.version, None);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "fields": {
                    "field1": {"en-US": "hello", "de-DE": "hallo"},
                    "field2": {"en-US": 42}
                }
            })
        );
    }

    #[test]
    fn test_server_assigned_id() {
        let mut spec = entry_spec();
        spec.entry_id = None;
        assert!(to_remote(&spec).sys.id.is_empty());
    }

    #[test]
    fn test_overlay_keeps_sys_and_reports_drift() {
        let spec = entry_spec();
        let mut remote = to_remote(&spec);
        remote.sys.version = Some(4);
        remote.sys.published_at = Some("2024-01-01T00:00:00Z".into());

        assert!(!overlay(&mut remote, &spec));

        let mut changed = spec.clone();
        changed.fields[0].content = "bye".into();
        assert!(overlay(&mut remote, &changed));
        assert_eq!(remote.sys.version, Some(4));
        assert!(remote.sys.is_published());
        assert_eq!(remote.fields["field1"]["en-US"], "bye");
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let mut spec = entry_spec();
        spec.fields[1].content = "3.0".into();
        let mut remote = to_remote(&spec);
        remote.fields = serde_json::from_value(json!({
            "field1": {"en-US": "hello"},
            "field2": {"en-US": 3}
        }))
        .unwrap();

        assert!(!overlay(&mut remote, &spec));

        spec.fields[1].content = "3.5".into();
        assert!(overlay(&mut remote, &spec));
        assert_eq!(remote.fields["field2"]["en-US"], json!(3.5));
    }

    #[test]
    fn test_from_remote_is_idempotent() {
        let mut remote = to_remote(&entry_spec());
        remote.sys.version = Some(1);
        remote.sys.space = Some(Link::new("Space", "sp1"));
        remote.sys.content_type = Some(Link::new("ContentType", "blogPost"));

        let first = from_remote(&remote);
        assert_eq!(first, from_remote(&remote));
        assert_eq!(
            first,
            EntryState {
                space_id: "sp1".into(),
                version: 1,
                content_type_id: "blogPost".into(),
            }
        );
    }
}
