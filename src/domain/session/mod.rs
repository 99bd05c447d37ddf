//! Research session domain

mod entity;
mod repository;

pub use entity::{SessionRecord, SessionSummary, Turn};
pub use repository::SessionStore;

#[cfg(test)]
pub use repository::MockSessionStore;
