//! Session state: the label graph and the items it is drawn on.

mod error;
mod graph;
mod session;

#[cfg(test)]
mod tests;

pub use error::SessionError;
pub use graph::DeletePolicy;
pub use session::{RedrawSink, Session};
