//! Core domain model for the task manager.
//!
//! Holds the `Task` entity with its invariants, the wire shapes exchanged over
//! the HTTP API and the request validator that turns raw payloads into domain
//! input. Shared by the server and the client.
pub mod task;
#[cfg(feature = "serde")]
pub mod wire;

pub use task::{Priority, Task, TaskError, TaskFields, Title};
