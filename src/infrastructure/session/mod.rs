//! Session store implementations

mod in_memory;
mod sweeper;

pub use in_memory::InMemorySessionStore;
pub use sweeper::spawn_idle_sweeper;
