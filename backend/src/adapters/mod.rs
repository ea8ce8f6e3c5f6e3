//! Implementations of the repository and platform ports

pub mod memory;
pub mod postgres;

pub use memory::{MemoryStore, PlatformEvent, RecordingPlatform};
pub use postgres::PgStore;
