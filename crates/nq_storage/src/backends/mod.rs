pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{InMemoryCache, InMemoryStorage};

#[cfg(feature = "sqlite")]
pub use sqlite::SQLiteStorage;
