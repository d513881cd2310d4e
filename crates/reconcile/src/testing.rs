//! Fixtures shared by the unit tests.

use crate::desired::{ContentTypeSpec, EntrySpec, FieldContent, FieldSpec, ItemsSpec, WebhookSpec};
use cmakit::Environment;
use cmakit::backend::memory::MemoryBackend;
use serde_json::json;
use std::collections::BTreeMap;

pub fn backend() -> MemoryBackend {
    MemoryBackend::new().with_environment("sp1", "master")
}

pub fn env() -> Environment {
    Environment::new("sp1", "master")
}

pub fn entry_spec() -> EntrySpec {
    EntrySpec {
        space_id: "sp1".into(),
        env_id: "master".into(),
        entry_id: Some("hello".into()),
        content_type_id: "blogPost".into(),
        locale: "en-US".into(),
        fields: vec![
            FieldContent {
                id: "field1".into(),
                locale: None,
                content: "hello".into(),
            },
            FieldContent {
                id: "field2".into(),
                locale: Some("en-US".into()),
                content: "42".into(),
            },
        ],
        published: false,
        archived: false,
    }
}

pub fn webhook_spec() -> WebhookSpec {
    WebhookSpec {
        space_id: "sp1".into(),
        name: "webhook-name".into(),
        url: "https://www.example.com/test".into(),
        http_basic_auth_username: Some("username".into()),
        http_basic_auth_password: Some("password".into()),
        headers: BTreeMap::from([
            ("Header2".to_string(), "Value2".to_string()),
            ("Header1".to_string(), "Value1".to_string()),
        ]),
        topics: vec![
            "Entry.create".into(),
            "ContentType.create".into(),
            "*.publish".into(),
        ],
    }
}

fn field(id: &str, field_type: &str) -> FieldSpec {
    FieldSpec {
        id: id.into(),
        name: format!("Field {id}"),
        field_type: field_type.into(),
        link_type: None,
        items: None,
        required: false,
        localized: false,
        disabled: false,
        omitted: false,
        validations: vec![],
    }
}

pub fn content_type_spec() -> ContentTypeSpec {
    ContentTypeSpec {
        space_id: "sp1".into(),
        env_id: "master".into(),
        content_type_id: Some("tf_test1".into()),
        name: "tf_test".into(),
        description: Some("Acceptance test content type".into()),
        display_field: Some("field1".into()),
        fields: vec![
            FieldSpec {
                required: true,
                validations: vec![json!({"size": {"min": 1, "max": null}})],
                ..field("field1", "Text")
            },
            FieldSpec {
                link_type: Some("Asset".into()),
                ..field("field2", "Link")
            },
            FieldSpec {
                items: Some(ItemsSpec {
                    item_type: "Link".into(),
                    link_type: Some("Entry".into()),
                    validations: vec![],
                }),
                ..field("field3", "Array")
            },
        ],
    }
}
