use async_trait::async_trait;
use chrono::Utc;
use pn_core::{Post, PostUrl, Result};
use tracing::debug;

use super::MetadataFetcher;

/// Builds posts from the URL alone, without touching the network.
#[derive(Debug, Clone, Default)]
pub struct UrlOnlyFetcher;

impl UrlOnlyFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataFetcher for UrlOnlyFetcher {
    fn name(&self) -> &str {
        "url"
    }

    async fn fetch(&self, url: &PostUrl) -> Result<Post> {
        debug!(url = %url.url, post_id = %url.post_id, "Building post from URL");
        Ok(Post::from_url(url, Utc::now()))
    }
}
