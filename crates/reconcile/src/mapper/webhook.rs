//! Webhook mapping.
//!
//! Headers are a map in the declaration and an ordered list on the wire; the
//! list is sorted by key so the same declaration always yields the same payload.

use crate::desired::WebhookSpec;
use crate::state::WebhookState;
use cmakit::{Webhook, WebhookHeader};
use std::collections::BTreeMap;

fn headers<'a>(map: impl IntoIterator<Item = (&'a String, &'a String)>) -> Vec<WebhookHeader> {
    let mut headers: Vec<WebhookHeader> = map
        .into_iter()
        .map(|(key, value)| WebhookHeader {
            key: key.clone(),
            value: value.clone(),
        })
        .collect();
    headers.sort_by(|a, b| a.key.cmp(&b.key));
    headers
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

pub fn to_remote(spec: &WebhookSpec) -> Webhook {
    let mut webhook = Webhook::default();
    overlay(&mut webhook, spec);
    webhook
}

/// Write the declaration onto a fetched webhook, keeping its `sys`.
///
/// Returns whether any readable attribute changed. The password is never
/// returned by the server, so it is set but does not count as a change.
pub fn overlay(remote: &mut Webhook, spec: &WebhookSpec) -> bool {
    let desired_headers = headers(&spec.headers);
    let remote_headers = headers(remote.headers.iter().map(|h| (&h.key, &h.value)));
    let username = non_empty(spec.http_basic_auth_username.as_ref());

    let changed = remote.name != spec.name
        || remote.url != spec.url
        || remote.topics != spec.topics
        || remote_headers != desired_headers
        || non_empty(remote.http_basic_username.as_ref()) != username;

    remote.name = spec.name.clone();
    remote.url = spec.url.clone();
    remote.topics = spec.topics.clone();
    remote.headers = desired_headers;
    remote.http_basic_username = username;
    remote.http_basic_password = non_empty(spec.http_basic_auth_password.as_ref());
    changed
}

pub fn from_remote(remote: &Webhook) -> WebhookState {
    WebhookState {
        space_id: remote.sys.space_id().to_string(),
        version: remote.sys.version.unwrap_or_default(),
        name: remote.name.clone(),
        url: remote.url.clone(),
        http_basic_auth_username: non_empty(remote.http_basic_username.as_ref()),
        headers: remote
            .headers
            .iter()
            .map(|h| (h.key.clone(), h.value.clone()))
            .collect::<BTreeMap<_, _>>(),
        topics: remote.topics.clone(),
    }
}
