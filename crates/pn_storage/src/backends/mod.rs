pub mod memory;

#[cfg(feature = "notion")]
pub mod notion;

pub use memory::InMemoryStore;

#[cfg(feature = "notion")]
pub use notion::{NotionConfig, NotionStore, PropertyNames};
