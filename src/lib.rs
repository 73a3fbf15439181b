//! satcore - sequence annotation tool core
//!
//! The editing core of an image annotation session: a sequence of items
//! (images), labels drawn on them, parent/child composition of labels,
//! previous/next tracking of one object across items, pixel-exact picking,
//! pointer-driven editing, and JSON load/save.
//!
//! Rendering, image decoding and transport are left to collaborators; see
//! [`state::RedrawSink`] and [`format::SessionBackend`].

pub mod color_utils;
pub mod config;
pub mod constants;
pub mod format;
pub mod interaction;
pub mod model;
pub mod state;
