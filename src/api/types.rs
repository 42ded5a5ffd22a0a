//! Loose response envelope handling.
//!
//! Listing endpoints share an item-array shape but disagree on details: the
//! cursor is `max_cursor` or `cursor`, numbers arrive as strings, `has_more`
//! is a bool or an integer. Pages are therefore decoded from raw JSON with
//! tolerant helpers instead of rigid structs.

use serde_json::Value;

use crate::media::ItemDocument;

/// One page of an enumeration.
#[derive(Debug)]
pub struct PageResult {
    pub items: Vec<ItemDocument>,
    /// Opaque resume token for the next page. Not comparable across scopes.
    pub next_cursor: String,
    pub has_more: bool,
}

impl PageResult {
    /// An empty terminal page.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: String::new(),
            has_more: false,
        }
    }
}

/// Decode a listing response body into a page.
///
/// `cursor_key` names the endpoint's resume-token field (`max_cursor` for
/// post/like listings, `cursor` for collection/music listings).
pub fn page_from_value(body: &Value, cursor_key: &str) -> PageResult {
    let items: Vec<ItemDocument> = body
        .get("aweme_list")
        .and_then(Value::as_array)
        .map(|list| list.iter().cloned().map(ItemDocument::new).collect())
        .unwrap_or_default();

    let next_cursor = body
        .get(cursor_key)
        .map(value_to_cursor)
        .unwrap_or_default();

    let has_more = body.get("has_more").map(value_truthy).unwrap_or(false);

    PageResult {
        items,
        next_cursor,
        has_more,
    }
}

/// One collection from a user's mix list.
#[derive(Debug, Clone)]
pub struct MixInfo {
    pub mix_id: String,
    pub mix_name: Option<String>,
}

/// One page of a user's collection list.
#[derive(Debug)]
pub struct MixListPage {
    pub mixes: Vec<MixInfo>,
    pub next_cursor: String,
    pub has_more: bool,
}

/// Decode a mix-list response body.
pub fn mix_list_from_value(body: &Value) -> MixListPage {
    let mixes = body
        .get("mix_infos")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|mix| {
                    let mix_id = mix.get("mix_id").map(value_to_cursor)?;
                    if mix_id.is_empty() {
                        return None;
                    }
                    let mix_name = mix
                        .get("mix_name")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);
                    Some(MixInfo { mix_id, mix_name })
                })
                .collect()
        })
        .unwrap_or_default();

    MixListPage {
        mixes,
        next_cursor: body.get("cursor").map(value_to_cursor).unwrap_or_default(),
        has_more: body.get("has_more").map(value_truthy).unwrap_or(false),
    }
}

/// Status code of an API body, where the endpoint has one. Zero is success.
pub fn status_code(body: &Value) -> Option<i64> {
    match body.get("status_code") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

/// Human-oriented error message some bodies carry.
pub fn status_msg(body: &Value) -> Option<&str> {
    body.get("status_msg")?.as_str().filter(|s| !s.is_empty())
}

fn value_to_cursor(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().map(|v| v != 0).unwrap_or(false),
        Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
