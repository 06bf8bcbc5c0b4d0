//! # Adapters Layer
//!
//! In-memory implementations of the outbound ports, used by tests and by
//! single-process deployments. Production deployments supply their own
//! store and directory adapters.

pub mod memory_store;
pub mod notifier;
pub mod user_directory;

pub use memory_store::MemoryCartStore;
pub use notifier::{RecordingNotifier, TracingNotifier};
pub use user_directory::MemoryUserDirectory;
