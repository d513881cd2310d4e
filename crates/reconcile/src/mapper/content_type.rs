//! Content type mapping.
//!
//! Field definitions pass through untouched, validations included: they are
//! opaque JSON and never merged or interpreted here.

use crate::desired::{ContentTypeSpec, FieldSpec, ItemsSpec};
use crate::state::ContentTypeState;
use cmakit::{ContentType, Field, FieldItems, Sys};

impl From<&FieldSpec> for Field {
    fn from(spec: &FieldSpec) -> Self {
        Field {
            id: spec.id.clone(),
            name: spec.name.clone(),
            field_type: spec.field_type.clone(),
            link_type: spec.link_type.clone(),
            items: spec.items.as_ref().map(|items| FieldItems {
                item_type: items.item_type.clone(),
                link_type: items.link_type.clone(),
                validations: items.validations.clone(),
            }),
            required: spec.required,
            localized: spec.localized,
            disabled: spec.disabled,
            omitted: spec.omitted,
            validations: spec.validations.clone(),
        }
    }
}

impl From<&Field> for FieldSpec {
    fn from(field: &Field) -> Self {
        FieldSpec {
            id: field.id.clone(),
            name: field.name.clone(),
            field_type: field.field_type.clone(),
            link_type: field.link_type.clone(),
            items: field.items.as_ref().map(|items| ItemsSpec {
                item_type: items.item_type.clone(),
                link_type: items.link_type.clone(),
                validations: items.validations.clone(),
            }),
            required: field.required,
            localized: field.localized,
            disabled: field.disabled,
            omitted: field.omitted,
            validations: field.validations.clone(),
        }
    }
}

pub fn to_remote(spec: &ContentTypeSpec) -> ContentType {
    let mut ct = ContentType {
        sys: spec.content_type_id.as_ref().map(Sys::with_id).unwrap_or_default(),
        ..Default::default()
    };
    overlay(&mut ct, spec);
    ct
}

/// Write the declaration onto a fetched content type, keeping its `sys`.
///
/// Returns whether anything changed.
pub fn overlay(remote: &mut ContentType, spec: &ContentTypeSpec) -> bool {
    let description = spec.description.clone().filter(|d| !d.is_empty());
    let fields: Vec<Field> = spec.fields.iter().map(Field::from).collect();

    let changed = remote.name != spec.name
        || remote.description.as_deref().filter(|d| !d.is_empty()) != description.as_deref()
        || remote.display_field != spec.display_field
        || remote.fields != fields;

    remote.name = spec.name.clone();
    remote.description = description;
    remote.display_field = spec.display_field.clone();
    remote.fields = fields;
    changed
}

/// Remote fields the declaration no longer has and that are not yet omitted.
pub fn removed_fields<'a>(remote: &'a ContentType, spec: &ContentTypeSpec) -> Vec<&'a str> {
    remote
        .fields
        .iter()
        .filter(|f| !f.omitted && !spec.fields.iter().any(|d| d.id == f.id))
        .map(|f| f.id.as_str())
        .collect()
}

/// Copy of `remote` with the given fields marked omitted.
///
/// A field has to be omitted and activated before the server accepts a
/// schema without it.
pub fn omit(remote: &ContentType, ids: &[&str]) -> ContentType {
    let mut ct = remote.clone();
    for field in &mut ct.fields {
        if ids.contains(&field.id.as_str()) {
            field.omitted = true;
        }
    }
    ct
}

pub fn from_remote(remote: &ContentType) -> ContentTypeState {
    ContentTypeState {
        space_id: remote.sys.space_id().to_string(),
        env_id: remote.sys.environment_id().to_string(),
        version: remote.sys.version.unwrap_or_default(),
        name: remote.name.clone(),
        description: remote.description.clone(),
        display_field: remote.display_field.clone(),
        fields: remote.fields.iter().map(FieldSpec::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::content_type_spec;
    use cmakit::Link;
    use serde_json::json;

    #[test]
    fn test_payload_passes_fields_through() {
        let ct = to_remote(&content_type_spec());
        assert_eq!(ct.sys.id, "tf_test1");

        let body = serde_json::to_value(&ct).unwrap();
        assert_eq!(body["name"], "tf_test");
        assert_eq!(body["displayField"], "field1");
        assert_eq!(body["fields"][1]["type"], "Link");
        assert_eq!(body["fields"][1]["linkType"], "Asset");
        assert_eq!(body["fields"][2]["items"]["type"], "Link");
        assert_eq!(body["fields"][2]["items"]["linkType"], "Entry");
        assert_eq!(
            body["fields"][0]["validations"],
            json!([{"size": {"min": 1, "max": null}}])
        );
        assert!(body.get("sys").is_none());
    }

    #[test]
    fn test_empty_description_is_dropped() {
        let mut spec = content_type_spec();
        spec.description = Some(String::new());
        assert_eq!(to_remote(&spec).description, None);
    }

    #[test]
    fn test_overlay_reports_drift() {
        let mut remote = to_remote(&content_type_spec());
        remote.description = Some(String::new());
        assert!(!overlay(&mut remote, &content_type_spec()));

        let mut spec = content_type_spec();
        spec.fields[0].localized = !spec.fields[0].localized;
        assert!(overlay(&mut remote, &spec));
        assert_eq!(remote.fields[0].localized, spec.fields[0].localized);
    }

    #[test]
    fn test_removed_fields() {
        let mut remote = to_remote(&content_type_spec());
        let mut spec = content_type_spec();
        spec.fields.truncate(1);

        assert_eq!(removed_fields(&remote, &spec), ["field2", "field3"]);

        remote = omit(&remote, &["field2"]);
        assert!(remote.fields[1].omitted);
        assert!(!remote.fields[2].omitted);
        assert_eq!(removed_fields(&remote, &spec), ["field3"]);
    }

    #[test]
    fn test_from_remote_roundtrips_schema() {
        let spec = content_type_spec();
        let mut remote = to_remote(&spec);
        remote.sys.version = Some(2);
        remote.sys.space = Some(Link::new("Space", "sp1"));
        remote.sys.environment = Some(Link::new("Environment", "master"));

        let state = from_remote(&remote);
        assert_eq!(state, from_remote(&remote));
        assert_eq!(state.env_id, "master");
        assert_eq!(state.version, 2);
        assert_eq!(state.fields, spec.fields);
    }
}
