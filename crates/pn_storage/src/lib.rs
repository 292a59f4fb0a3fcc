use pn_core::{Error, PostStore, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

/// Storage backends selectable at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Notion,
    Memory,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "notion" => Ok(Self::Notion),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notion => write!(f, "notion"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Builds the store for `kind`. Notion needs a config with credentials.
#[cfg(feature = "notion")]
pub fn create_storage(kind: StorageKind, notion: Option<NotionConfig>) -> Result<Arc<dyn PostStore>> {
    match kind {
        StorageKind::Memory => Ok(Arc::new(InMemoryStore::new())),
        StorageKind::Notion => {
            let config = notion.ok_or_else(|| {
                Error::Config("NOTION_TOKEN and NOTION_DATABASE_ID must be set".to_string())
            })?;
            Ok(Arc::new(NotionStore::new(config)?))
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::StorageKind;
    #[cfg(feature = "notion")]
    pub use super::create_storage;
}
