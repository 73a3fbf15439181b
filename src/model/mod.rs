//! Data models for the annotation session.

mod event;
mod geometry;
mod item;
mod label;

pub use event::{EventAction, SessionEvent, now_millis};
pub use geometry::{
    BODY_HANDLE, BOX_HANDLE_COUNT, BoxGeometry, BoxHandle, CREATION_HANDLE, Frame, Point,
};
pub use item::Item;
pub use label::{Attributes, LabelId, LabelNode, LabelShape, LabelTemplate};
