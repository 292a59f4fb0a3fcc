use async_trait::async_trait;
use pn_core::{Error, Post, PostStore, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub post: Post,
}

#[derive(Default)]
pub struct MemoryStore {
    records: Vec<StoredRecord>,
    by_url: HashMap<String, usize>,
    by_post_id: HashMap<String, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, post: &Post) -> Option<&StoredRecord> {
        self.by_url
            .get(&post.url)
            .or_else(|| self.by_post_id.get(&post.id))
            .map(|&idx| &self.records[idx])
    }

    pub fn insert(&mut self, post: &Post) -> Result<String> {
        if let Some(existing) = self.find(post) {
            return Err(Error::Conflict(existing.id.clone()));
        }

        let idx = self.records.len();
        let id = format!("memory-{}", idx + 1);
        self.records.push(StoredRecord {
            id: id.clone(),
            post: post.clone(),
        });
        self.by_url.insert(post.url.clone(), idx);
        self.by_post_id.insert(post.id.clone(), idx);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Post store kept in process memory, keyed by URL and post id.
///
/// Unlike the hosted backends it enforces uniqueness on write.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_existing(&self, post: &Post) -> Result<Option<String>> {
        let store = self.store.read().await;
        Ok(store.find(post).map(|record| record.id.clone()))
    }

    async fn create(&self, post: &Post) -> Result<String> {
        let mut store = self.store.write().await;
        store.insert(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pn_core::parse_post_url;

    fn post(url: &str) -> Post {
        Post::from_url(&parse_post_url(url).unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = InMemoryStore::new();
        let post = post("https://www.threads.net/@alice/post/XYZ123");

        assert!(storage.find_existing(&post).await.unwrap().is_none());
        let id = storage.create(&post).await.unwrap();
        assert_eq!(storage.find_existing(&post).await.unwrap(), Some(id));
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let storage = InMemoryStore::new();
        let first = post("https://www.threads.net/@alice/post/XYZ123");
        let id = storage.create(&first).await.unwrap();

        match storage.create(&first).await {
            Err(Error::Conflict(existing)) => assert_eq!(existing, id),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_same_post_id_under_other_url_matches() {
        let storage = InMemoryStore::new();
        let id = storage
            .create(&post("https://www.threads.net/@alice/post/XYZ123"))
            .await
            .unwrap();
        let moved = post("https://www.threads.com/@alice/post/XYZ123?xmt=1");
        assert_eq!(storage.find_existing(&moved).await.unwrap(), Some(id));
    }
}
