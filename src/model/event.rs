//! Audit log entries.

use serde::{Deserialize, Serialize};

use crate::constants::NO_LABEL;

/// Kinds of events the session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    /// The image backing an item finished loading.
    Loaded,
    /// The active item changed.
    GotoItem,
    /// A label was created.
    CreateLabel,
    /// A label (and its cascade) was deleted.
    DeleteLabel,
    /// A track was ended at a label.
    EndTrack,
    /// A degenerate label was thrown away right after drawing.
    DiscardLabel,
    /// Two labels were linked into a tracking chain.
    LinkLabels,
    /// An id referenced during load did not resolve.
    DanglingReference,
    /// A previous/next id did not resolve during a chain walk.
    OrphanedChain,
}

impl EventAction {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Loaded => "loaded",
            EventAction::GotoItem => "gotoItem",
            EventAction::CreateLabel => "createLabel",
            EventAction::DeleteLabel => "deleteLabel",
            EventAction::EndTrack => "endTrack",
            EventAction::DiscardLabel => "discardLabel",
            EventAction::LinkLabels => "linkLabels",
            EventAction::DanglingReference => "danglingReference",
            EventAction::OrphanedChain => "orphanedChain",
        }
    }
}

/// One audit log entry. Never mutated once appended.
///
/// `action` stays a plain string so that logs written by other clients
/// survive a load/save cycle untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub action: String,
    /// Item the event happened on, -1 if none.
    #[serde(default = "no_index")]
    pub item_index: i64,
    /// Label the event concerns, -1 if none.
    #[serde(default = "no_index")]
    pub label_id: i64,
    /// Pointer position or geometry the event happened at.
    #[serde(default)]
    pub position: Option<Vec<f32>>,
}

fn no_index() -> i64 {
    NO_LABEL
}

impl SessionEvent {
    pub fn new(timestamp: i64, action: EventAction) -> Self {
        Self {
            timestamp,
            action: action.as_str().to_string(),
            item_index: NO_LABEL,
            label_id: NO_LABEL,
            position: None,
        }
    }

    pub fn with_item(mut self, index: usize) -> Self {
        self.item_index = index as i64;
        self
    }

    pub fn with_label(mut self, id: u32) -> Self {
        self.label_id = i64::from(id);
        self
    }

    pub fn with_position(mut self, position: Vec<f32>) -> Self {
        self.position = Some(position);
        self
    }

    /// Check if the event is of the given kind.
    pub fn is(&self, action: EventAction) -> bool {
        self.action == action.as_str()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
