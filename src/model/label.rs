//! Label data model.
//!
//! A label is one annotated region (or a composite grouping other labels).
//! Labels never hold references to each other; parent, children and the
//! previous/next tracking chain are all stored as [`LabelId`]s and resolved
//! through the session's label arena.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::geometry::{BODY_HANDLE, BoxGeometry, BoxHandle, Frame, Point};

/// Unique identifier for a label, stable for the whole session.
pub type LabelId = u32;

/// Open-ended auxiliary flags (occluded, truncated, ...).
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Geometry of a label. Each variant exposes the same capabilities so the
/// interaction layer never needs to know which kind it is editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LabelShape {
    /// Axis-aligned bounding box.
    Box(BoxGeometry),
}

impl LabelShape {
    /// Get the shape type name.
    pub fn kind(&self) -> &'static str {
        match self {
            LabelShape::Box(_) => "box",
        }
    }

    /// Axis-aligned bounds of the shape.
    pub fn bounds(&self) -> BoxGeometry {
        match self {
            LabelShape::Box(b) => *b,
        }
    }

    /// Resize handles and their canvas positions, in drawing order.
    pub fn handles(&self) -> Vec<(u8, Point)> {
        match self {
            LabelShape::Box(b) => BoxHandle::all()
                .iter()
                .map(|h| (*h as u8, b.handle_position(*h)))
                .collect(),
        }
    }

    /// Drag a resize handle to `point`. Unknown handles and the body handle
    /// leave the shape untouched.
    pub fn resize_with_handle(&mut self, handle: u8, point: Point) {
        match self {
            LabelShape::Box(b) => {
                if let Some(handle) = BoxHandle::from_id(handle) {
                    b.drag_handle(handle, point);
                } else if handle != BODY_HANDLE {
                    log::warn!("Ignoring unknown box handle {}", handle);
                }
            }
        }
    }

    /// Translate the shape by a delta.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            LabelShape::Box(b) => {
                b.x += dx;
                b.y += dy;
            }
        }
    }

    /// Make extents non-negative.
    pub fn normalize(&mut self) {
        match self {
            LabelShape::Box(b) => b.normalize(),
        }
    }

    /// Keep the shape inside the drawing frame.
    pub fn clamp_to(&mut self, frame: &Frame) {
        match self {
            LabelShape::Box(b) => b.clamp_to(frame),
        }
    }

    /// Check if the shape is too small to keep.
    pub fn is_degenerate(&self, min_size: f32) -> bool {
        match self {
            LabelShape::Box(b) => b.w.abs() < min_size || b.h.abs() < min_size,
        }
    }
}

/// What a new label is created with: its category and attribute flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTemplate {
    pub category_path: String,
    pub attributes: Attributes,
}

impl LabelTemplate {
    pub fn new(category_path: impl Into<String>) -> Self {
        Self {
            category_path: category_path.into(),
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute to the template.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// One node of the label graph.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelNode {
    /// Unique identifier, never reused.
    pub id: LabelId,
    /// Category path (e.g. "vehicle/car"). Loaded sessions may lack one.
    pub category_path: Option<String>,
    /// Auxiliary flags.
    pub attributes: Attributes,
    /// False once deleted. Deleted labels stay addressable by id.
    pub valid: bool,
    /// Item this label is drawn on, if any.
    pub item_index: Option<usize>,
    /// Composite label this one belongs to.
    pub parent: Option<LabelId>,
    /// Sub-labels, in insertion order.
    pub children: Vec<LabelId>,
    /// Same tracked object on an earlier item.
    pub previous_label_id: Option<LabelId>,
    /// Same tracked object on a later item.
    pub next_label_id: Option<LabelId>,
    /// Geometry. Pure composite labels have none.
    pub shape: Option<LabelShape>,
}

impl LabelNode {
    /// Create a valid, unlinked label.
    pub fn new(id: LabelId, category_path: Option<String>) -> Self {
        Self {
            id,
            category_path,
            attributes: Attributes::new(),
            valid: true,
            item_index: None,
            parent: None,
            children: Vec::new(),
            previous_label_id: None,
            next_label_id: None,
            shape: None,
        }
    }

    /// Check if the label takes part in a tracking chain.
    pub fn is_tracked(&self) -> bool {
        self.previous_label_id.is_some() || self.next_label_id.is_some()
    }
}
