use nq_core::{ArticleStorage, CacheStorage, Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            #[cfg(feature = "sqlite")]
            "sqlite" => Ok(StorageKind::Sqlite),
            other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => f.write_str("memory"),
            #[cfg(feature = "sqlite")]
            StorageKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// The article store and the chat cache a deployment runs against.
#[derive(Clone)]
pub struct Stores {
    pub articles: Arc<dyn ArticleStorage>,
    pub cache: Arc<dyn CacheStorage>,
}

pub async fn create_storage(kind: &str, backend_url: Option<&str>) -> Result<Stores> {
    let kind = StorageKind::from_str(kind)?;
    tracing::debug!("Creating {} storage", kind);

    match kind {
        StorageKind::Memory => Ok(Stores {
            articles: Arc::new(InMemoryStorage::new()),
            cache: Arc::new(InMemoryCache::new()),
        }),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let storage = match backend_url {
                Some(url) => SQLiteStorage::connect(url).await?,
                None => SQLiteStorage::new_with_path(&sqlite::default_db_path()).await?,
            };
            let storage = Arc::new(storage);
            Ok(Stores {
                articles: storage.clone(),
                cache: storage,
            })
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageKind, Stores};
}
