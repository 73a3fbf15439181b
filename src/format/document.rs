//! Wire representation of a session.
//!
//! These structs mirror the JSON document exchanged with the backend. Label
//! references are plain integers with `-1` meaning "none", which is why they
//! are kept as `i64` here and only turned into [`LabelId`]s by the codec.

use serde::{Deserialize, Serialize};

use crate::constants::NO_LABEL;
use crate::model::{Attributes, LabelId, LabelShape, SessionEvent};

/// The whole session document.
///
/// `items` is the only required field; everything else defaults so that
/// partial documents from older clients still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    #[serde(default)]
    pub project_name: String,

    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub start_time: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_index: Option<usize>,

    pub items: Vec<ItemEntry>,

    #[serde(default)]
    pub labels: Vec<LabelEntry>,

    /// Opaque, passed through unmodified.
    #[serde(default)]
    pub categories: serde_json::Value,

    #[serde(default)]
    pub events: Vec<SessionEvent>,

    #[serde(default)]
    pub user_agent: String,

    /// Opaque, passed through unmodified.
    #[serde(default)]
    pub ip_info: serde_json::Value,

    /// Highest id ever allocated, including deleted labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_label_id: Option<LabelId>,
}

/// One item (image) entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEntry {
    pub url: String,

    #[serde(default = "no_label")]
    pub index: i64,

    /// Labels attached to the item. May contain ids with no matching label.
    #[serde(default)]
    pub label_ids: Vec<i64>,
}

/// One label entry. Only valid labels are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelEntry {
    pub id: LabelId,

    #[serde(default)]
    pub category_path: Option<String>,

    #[serde(default = "no_label")]
    pub parent: i64,

    /// Omitted when the label has no valid children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<i64>>,

    #[serde(default = "no_label")]
    pub previous_label_id: i64,

    #[serde(default = "no_label")]
    pub next_label_id: i64,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<LabelShape>,
}

impl LabelEntry {
    /// Create an unlinked label entry.
    pub fn new(id: LabelId, category_path: impl Into<String>) -> Self {
        Self {
            id,
            category_path: Some(category_path.into()),
            parent: NO_LABEL,
            children: None,
            previous_label_id: NO_LABEL,
            next_label_id: NO_LABEL,
            attributes: Attributes::new(),
            shape: None,
        }
    }
}

fn no_label() -> i64 {
    NO_LABEL
}

/// Wire value of an optional label reference.
pub fn to_wire(id: Option<LabelId>) -> i64 {
    id.map(i64::from).unwrap_or(NO_LABEL)
}

/// Label reference from a wire value. Negative or out-of-range values mean
/// "none".
pub fn from_wire(value: i64) -> Option<LabelId> {
    LabelId::try_from(value).ok()
}
