use async_trait::async_trait;
use crate::types::Post;
use crate::Result;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Short name of the backend, used in logs and health output
    fn name(&self) -> &str;

    /// Look up a record matching the post's URL (or post id), returning its identifier
    async fn find_existing(&self, post: &Post) -> Result<Option<String>>;

    /// Create a record for the post, returning the new identifier.
    ///
    /// Backends able to enforce uniqueness return `Error::Conflict` with the
    /// existing identifier instead of writing a duplicate.
    async fn create(&self, post: &Post) -> Result<String>;
}
