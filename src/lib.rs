// tasklist - personal task list backed by a pluggable key-value store

pub mod config;
pub mod error;
pub mod file;
pub mod gate;
pub mod kv;
pub mod models;
pub mod query;
pub mod sqlite;
pub mod store;

// Re-export main types for convenience
pub use config::{BackendKind, Config};
pub use error::{TaskError, ValidationError};
pub use file::FileStore;
pub use gate::DeleteGate;
pub use kv::{KeyValueStore, MemoryStore};
pub use models::{Category, Priority, Task, TaskFields, TaskId};
pub use query::{Query, SortOrder, StatusFilter, query};
pub use sqlite::SqliteStore;
pub use store::{DEFAULT_KEY, TaskStore};
