//! Session load/save.
//!
//! This module turns a [`Session`](crate::state::Session) into the wire JSON
//! document exchanged with the backend, and back.
//!
//! ## Document shape
//!
//! ```text
//! {
//!   projectName, startTime, taskIndex?, lastLabelId?,
//!   items:  [ { url, index, labelIds: [id] } ],
//!   labels: [ { id, categoryPath, parent, children?, previousLabelId,
//!               nextLabelId, attributes?, shape? } ],
//!   categories, events, userAgent, ipInfo
//! }
//! ```
//!
//! Missing references are written as `-1`. Only valid labels are written.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use satcore::format::{FileBackend, TaskKey};
//! use satcore::state::Session;
//!
//! let backend = FileBackend::new("/var/lib/satcore");
//! let mut session = Session::load(&backend, 0, "traffic")?;
//! // ... edit ...
//! session.save(&backend);
//! ```

mod auto_save;
mod backend;
mod codec;
mod document;

#[cfg(test)]
mod tests;

pub use auto_save::AutoSaveManager;
pub use backend::{FileBackend, MemoryBackend, SessionBackend, TaskKey};
pub use codec::{decode, decode_pointers, decode_variables, encode, from_json, to_json};
pub use document::{ItemEntry, LabelEntry, SessionDocument, from_wire, to_wire};
