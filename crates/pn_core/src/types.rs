use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::post_url::PostUrl;

/// Placeholder used when a post's author handle cannot be determined.
pub const UNKNOWN_AUTHOR: &str = "알 수 없음";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
    pub name: String,
}

impl Author {
    pub fn unknown() -> Self {
        Self {
            username: UNKNOWN_AUTHOR.to_string(),
            name: UNKNOWN_AUTHOR.to_string(),
        }
    }
}

/// How the metadata of a post was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostOrigin {
    /// Derived from the URL alone.
    Url,
    /// Extracted from the rendered page.
    Rendered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub url: String,
    pub author: Author,
    pub content: String,
    pub image_urls: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub likes: u64,
    pub comments: u64,
    pub origin: PostOrigin,
}

impl Post {
    /// Builds a post from what the URL itself tells us.
    pub fn from_url(parsed: &PostUrl, now: DateTime<Utc>) -> Self {
        let author = match &parsed.username {
            Some(username) => Author {
                username: username.clone(),
                name: username.clone(),
            },
            None => Author::unknown(),
        };

        Self {
            id: parsed.post_id.clone(),
            url: parsed.url.clone(),
            author,
            content: String::new(),
            image_urls: vec![],
            timestamp: now,
            likes: 0,
            comments: 0,
            origin: PostOrigin::Url,
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.origin == PostOrigin::Rendered
    }
}

/// Result of importing a single post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Created { id: String },
    Existing { id: String },
}

impl ImportOutcome {
    pub fn id(&self) -> &str {
        match self {
            ImportOutcome::Created { id } | ImportOutcome::Existing { id } => id,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, ImportOutcome::Existing { .. })
    }
}
