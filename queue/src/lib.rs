pub mod memory;
pub mod queue;
pub mod types;

pub use memory::{InMemoryJobQueue, QueuedJob};
pub use queue::JobQueue;
pub use types::*;
