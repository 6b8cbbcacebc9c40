//! Target extraction
//!
//! Works out which user, tenant and org unit a request acts upon. Sources are
//! tried in a fixed order and the first non-empty value wins:
//!
//! | field         | 1. query      | 2. path pattern     | 3. route param | 4. JSON body  |
//! |---------------|---------------|---------------------|----------------|---------------|
//! | `user_id`     | `user_id`     | `/v{n}/users/{id}`  | `id`           | `user_id`     |
//! | `tenant_id`   | `tenant_id`   | -                   | `tenant_id`    | `tenant_id`   |
//! | `org_unit_id` | `org_unit_id` | -                   | `org_unit_id`  | `org_unit_id` |
//!
//! The body is buffered at most once and handed back unchanged, so handlers can
//! still extract it. Bodies larger than [`MAX_INSPECTED_BODY_BYTES`] are not
//! inspected; whatever was read of them is replayed ahead of the unread rest.

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{FromRequestParts, Query, RawPathParams, Request},
    http::{header::CONTENT_LENGTH, request::Parts, HeaderMap, Uri},
};
use http_body_util::BodyExt;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;
use tokio_stream::StreamExt;
use tracing::debug;

use super::middleware::original_path;
use crate::domain::TargetIdentity;

pub const USER_ID_KEY: &str = "user_id";
pub const TENANT_ID_KEY: &str = "tenant_id";
pub const ORG_UNIT_ID_KEY: &str = "org_unit_id";

/// Route parameter holding the primary subject's ID
pub const ROUTE_ID_PARAM: &str = "id";

/// Largest body that will be buffered for inspection (1 MiB)
pub const MAX_INSPECTED_BODY_BYTES: usize = 1024 * 1024;

static USER_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/v[0-9]+/users/([^/]+)$").expect("user path pattern is valid")
});

/// Extract the user ID from a versioned `/v{n}/users/{id}` path.
///
/// The segment is percent-decoded, so it agrees with the router's `:id` param.
pub fn user_id_from_path(path: &str) -> Option<Cow<'_, str>> {
    USER_PATH_PATTERN
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| percent_decode_str(m.as_str()).decode_utf8_lossy())
}

/// Find the target identifiers of `request`.
///
/// Returns the request with its body restored byte-for-byte. Missing
/// identifiers are empty strings; malformed JSON bodies are treated as `{}`.
pub async fn extract_targets(request: Request<Body>) -> (TargetIdentity, Request<Body>) {
    let (mut parts, body) = request.into_parts();

    let query = query_params(&parts.uri);
    let route = route_params(&mut parts).await;
    let path = original_path(&parts.uri, &parts.extensions);

    let from_request = |key: &str| {
        non_empty(query.get(key).map(String::as_str))
            .or_else(|| non_empty(route.get(key).map(String::as_str)))
    };

    let user_id = non_empty(query.get(USER_ID_KEY).map(String::as_str))
        .map(String::from)
        .or_else(|| {
            user_id_from_path(path)
                .filter(|id| !id.is_empty())
                .map(Cow::into_owned)
        })
        .or_else(|| non_empty(route.get(ROUTE_ID_PARAM).map(String::as_str)).map(String::from));
    let tenant_id = from_request(TENANT_ID_KEY).map(String::from);
    let org_unit_id = from_request(ORG_UNIT_ID_KEY).map(String::from);

    let (fields, body) = if user_id.is_some() && tenant_id.is_some() && org_unit_id.is_some() {
        (Map::new(), body)
    } else {
        inspect_body(&parts.headers, body).await
    };

    let resolve = |found: Option<String>, key: &str| {
        found
            .or_else(|| body_string(&fields, key))
            .unwrap_or_default()
    };

    let targets = TargetIdentity {
        user_id: resolve(user_id, USER_ID_KEY),
        tenant_id: resolve(tenant_id, TENANT_ID_KEY),
        org_unit_id: resolve(org_unit_id, ORG_UNIT_ID_KEY),
    };

    (targets, Request::from_parts(parts, body))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn query_params(uri: &Uri) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default()
}

/// Route parameters matched by the router. Empty outside a matched route.
async fn route_params(parts: &mut Parts) -> HashMap<String, String> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => params
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        Err(_) => HashMap::new(),
    }
}

fn body_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Buffer the body, parse it as a JSON object, and return a replacement body
/// carrying the same bytes.
///
/// Bodies known to exceed the limit are returned untouched. A body of unknown
/// length is read frame by frame; if it overflows or fails midway, the bytes read
/// so far are chained in front of the remainder and nothing is inspected.
async fn inspect_body(headers: &HeaderMap, mut body: Body) -> (Map<String, Value>, Body) {
    let declared_len = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let hinted_len = body.size_hint().lower();

    if declared_len.unwrap_or(0).max(hinted_len) > MAX_INSPECTED_BODY_BYTES as u64 {
        debug!(
            content_length = declared_len,
            size_hint = hinted_len,
            "skipping target extraction from oversized body"
        );
        return (Map::new(), body);
    }

    let mut buffered = Vec::new();
    loop {
        let data = match body.frame().await {
            None => break,
            Some(Ok(frame)) => match frame.into_data() {
                Ok(data) => data,
                Err(_) => continue,
            },
            Some(Err(e)) => {
                debug!(error = %e, "failed to buffer request body for target extraction");
                return (Map::new(), replay(buffered, Err(e)));
            }
        };

        buffered.extend_from_slice(&data);
        if buffered.len() > MAX_INSPECTED_BODY_BYTES {
            debug!(
                buffered = buffered.len(),
                "skipping target extraction from oversized streamed body"
            );
            return (Map::new(), replay(buffered, Ok(body)));
        }
    }

    let bytes = Bytes::from(buffered);
    (parse_json_object(&bytes), Body::from(bytes))
}

/// Rebuild a partially read body: the buffered prefix followed by the unread
/// rest, or by the error that interrupted reading.
fn replay(prefix: Vec<u8>, rest: Result<Body, axum::Error>) -> Body {
    let prefix = tokio_stream::once(Ok::<_, axum::Error>(Bytes::from(prefix)));
    match rest {
        Ok(body) => Body::from_stream(prefix.chain(body.into_data_stream())),
        Err(e) => Body::from_stream(prefix.chain(tokio_stream::once(Err(e)))),
    }
}

fn parse_json_object(bytes: &Bytes) -> Map<String, Value> {
    if bytes.is_empty() {
        return Map::new();
    }
    serde_json::from_slice(bytes).unwrap_or_default()
}
