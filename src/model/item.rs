//! Item (image) data model.

use super::label::LabelId;

/// One image of the annotated sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Position in the session's item list.
    pub index: usize,
    /// Source reference of the image, not interpreted here.
    pub url: String,
    /// Labels drawn on this item. Later entries are drawn and picked on top.
    pub label_refs: Vec<LabelId>,
    /// Currently selected label on this item.
    pub selected_label: Option<LabelId>,
    /// Whether this is the active item.
    pub active: bool,
    /// Set once the image resource has loaded.
    pub ready: bool,
}

impl Item {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
            label_refs: Vec::new(),
            selected_label: None,
            active: false,
            ready: false,
        }
    }

    /// Remove a label from the render list, dropping the selection if it
    /// pointed at that label. Returns true if the label was present.
    pub fn detach_label(&mut self, id: LabelId) -> bool {
        let before = self.label_refs.len();
        self.label_refs.retain(|l| *l != id);
        if self.selected_label == Some(id) {
            self.selected_label = None;
        }
        self.label_refs.len() != before
    }

    /// Position of a label in the render list (its hit-test slot).
    pub fn slot_of(&self, id: LabelId) -> Option<usize> {
        self.label_refs.iter().position(|l| *l == id)
    }
}
