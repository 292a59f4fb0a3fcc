pub mod error;
pub mod post_url;
pub mod storage;
pub mod text;
pub mod types;

pub use error::Error;
pub use post_url::{parse_post_url, PostUrl};
pub use storage::PostStore;
pub use types::{Author, ImportOutcome, Post, PostOrigin};

pub type Result<T> = std::result::Result<T, Error>;
