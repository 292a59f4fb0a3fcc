use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pn_core::text::parse_count;
use pn_core::types::UNKNOWN_AUTHOR;
use pn_core::{Author, Post, PostOrigin, PostUrl, Result};
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use super::jsonld;
use super::utils::{self, selector};
use super::MetadataFetcher;
use crate::render::{PageRenderer, MOBILE_USER_AGENT};

/// Wrapper around a single post (the first one on a post page is the post itself).
const POST_CONTAINER: &str = "div[data-pressable-container]";
const POST_TEXT: &str = "div[data-pressable-container] span[dir='auto'], article";
const POST_IMAGES: &str = "img[src]";
const POST_TIME: &str = "time[datetime]";
const ICONS: &str = "svg[aria-label]";

const LIKE_LABELS: &[&str] = &["Like", "좋아요"];
const COMMENT_LABELS: &[&str] = &["Comment", "Reply", "댓글", "답글"];

/// Fetches post metadata by rendering the post page in a headless browser.
pub struct RenderedFetcher {
    renderer: Arc<dyn PageRenderer>,
    user_agent: String,
}

impl RenderedFetcher {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            renderer,
            user_agent: MOBILE_USER_AGENT.to_string(),
        }
    }
}

#[async_trait]
impl MetadataFetcher for RenderedFetcher {
    fn name(&self) -> &str {
        self.renderer.name()
    }

    async fn fetch(&self, url: &PostUrl) -> Result<Post> {
        let html = self.renderer.render(&url.url, &self.user_agent).await?;
        let post = extract_post(&html, url, Utc::now())?;
        info!(
            url = %post.url,
            author = %post.author.username,
            images = post.image_urls.len(),
            likes = post.likes,
            comments = post.comments,
            "Scraped post"
        );
        Ok(post)
    }
}

/// Splits an `og:title` like "Alice Kim (@alice) on Threads" into name and handle.
fn parse_og_title(title: &str) -> (Option<String>, Option<String>) {
    let title = title.trim().trim_end_matches("on Threads").trim();
    match title.rsplit_once("(@") {
        Some((name, rest)) => {
            let handle = rest.split(')').next().unwrap_or_default().trim();
            let name = name.trim();
            (
                (!name.is_empty()).then(|| name.to_string()),
                (!handle.is_empty()).then(|| handle.to_string()),
            )
        }
        None => ((!title.is_empty()).then(|| title.to_string()), None),
    }
}

fn first_meta(document: &Html, keys: &[&str]) -> Result<Option<String>> {
    for key in keys {
        if let Some(content) = utils::meta_content(document, key)? {
            return Ok(Some(content));
        }
    }
    Ok(None)
}

fn post_images(scope: ElementRef<'_>, base: Option<&Url>) -> Result<Vec<String>> {
    let images = selector(POST_IMAGES)?;
    Ok(scope
        .select(&images)
        .filter(|img| {
            let alt = img.value().attr("alt").unwrap_or_default().to_lowercase();
            !alt.contains("profile picture") && !alt.contains("프로필 사진")
        })
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.starts_with("data:"))
        .filter_map(|src| match base {
            Some(base) => base.join(src).ok().map(String::from),
            None => Some(src.to_string()),
        })
        .collect())
}

/// Reads the counter shown on the button whose icon carries one of `labels`.
fn button_count(scope: ElementRef<'_>, labels: &[&str]) -> Result<Option<u64>> {
    let icons = selector(ICONS)?;
    Ok(scope
        .select(&icons)
        .find(|icon| {
            icon.value()
                .attr("aria-label")
                .map_or(false, |label| labels.contains(&label))
        })
        .and_then(utils::enclosing_button)
        .map(|button| parse_count(&button.text().collect::<String>())))
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter().filter(|url| seen.insert(url.clone())).collect()
}

/// Extracts a post from the rendered page.
///
/// JSON-LD metadata wins where present; Open Graph tags and the post markup
/// fill in the rest.
pub fn extract_post(html: &str, url: &PostUrl, now: DateTime<Utc>) -> Result<Post> {
    let document = Html::parse_document(html);
    let posting = jsonld::extract_posting(&document).unwrap_or_default();

    let container = selector(POST_CONTAINER)?;
    let scope = document
        .select(&container)
        .next()
        .unwrap_or_else(|| document.root_element());

    let (title_name, title_handle) = match utils::meta_content(&document, "og:title")? {
        Some(title) => parse_og_title(&title),
        None => (None, None),
    };

    let username = url
        .username
        .clone()
        .or(posting.author_handle.clone())
        .or(title_handle)
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let name = posting
        .author_name
        .clone()
        .or(title_name)
        .unwrap_or_else(|| username.clone());

    let content = match posting.body.clone() {
        Some(body) => body,
        None => match first_meta(&document, &["og:description", "description"])? {
            Some(description) => description,
            None => utils::extract_text(&document, POST_TEXT)?.unwrap_or_default(),
        },
    };

    let base = Url::parse(&url.url).ok();
    let mut image_urls = posting.images.clone();
    image_urls.extend(post_images(scope, base.as_ref())?);
    let image_urls = dedup_preserving_order(image_urls);

    let timestamp = match posting.published_at {
        Some(published_at) => published_at,
        None => {
            let time = selector(POST_TIME)?;
            scope
                .select(&time)
                .filter_map(|el| el.value().attr("datetime"))
                .find_map(|dt| DateTime::parse_from_rfc3339(dt).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(now)
        }
    };

    let likes = match posting.likes {
        Some(likes) => likes,
        None => button_count(scope, LIKE_LABELS)?.unwrap_or(0),
    };
    let comments = match posting.comments {
        Some(comments) => comments,
        None => button_count(scope, COMMENT_LABELS)?.unwrap_or(0),
    };

    debug!(url = %url.url, jsonld = posting != jsonld::Posting::default(), "Extracted post metadata");

    Ok(Post {
        id: url.post_id.clone(),
        url: url.url.clone(),
        author: Author { username, name },
        content,
        image_urls,
        timestamp,
        likes,
        comments,
        origin: PostOrigin::Rendered,
    })
}
