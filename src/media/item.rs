//! Partially-known item metadata documents.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// One acquirable unit of content as returned by the upstream API.
///
/// The upstream schema is undocumented and shifts between endpoints, so the
/// document is kept as raw JSON and read through accessors that return
/// `Option` instead of assuming any field exists. Only the handful of fields
/// the pipeline needs are exposed.
#[derive(Debug, Clone)]
pub struct ItemDocument {
    doc: Value,
}

impl ItemDocument {
    /// Wrap a metadata document, unwrapping the `aweme` / `aweme_detail`
    /// envelopes some endpoints add around the item body.
    pub fn new(doc: Value) -> Self {
        let doc = match doc {
            Value::Object(mut map) => {
                if let Some(inner @ Value::Object(_)) = map.remove("aweme_detail") {
                    inner
                } else if let Some(inner @ Value::Object(_)) = map.remove("aweme") {
                    inner
                } else {
                    Value::Object(map)
                }
            }
            other => other,
        };
        Self { doc }
    }

    /// The raw document, for snapshot serialization.
    pub fn raw(&self) -> &Value {
        &self.doc
    }

    /// Stable numeric item id. Upstream serializes it as either a number or
    /// a digit string.
    pub fn item_id(&self) -> Option<i64> {
        match self.doc.get("aweme_id") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }

    /// Creation timestamp (upstream sends epoch seconds).
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.doc.get("create_time")?.as_i64()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Author/owner identifier (`sec_uid`).
    pub fn author_id(&self) -> Option<&str> {
        self.doc.get("author")?.get("sec_uid")?.as_str()
    }

    /// Author display name.
    pub fn author_name(&self) -> Option<&str> {
        self.doc.get("author")?.get("nickname")?.as_str()
    }

    /// Item caption/description.
    pub fn title(&self) -> Option<&str> {
        self.doc.get("desc")?.as_str().filter(|s| !s.is_empty())
    }

    /// Whether this item is an image set rather than a video.
    pub fn is_image_set(&self) -> bool {
        self.doc
            .get("images")
            .and_then(Value::as_array)
            .map(|a| !a.is_empty())
            .unwrap_or(false)
    }
}
