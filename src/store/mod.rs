//! Persistence layer — the session collection over a pluggable blob backend.

pub mod backend;
pub mod file;
pub mod memory;
pub mod sessions;

pub use backend::StorageBackend;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use sessions::{DEFAULT_STORAGE_KEY, SessionStore};
