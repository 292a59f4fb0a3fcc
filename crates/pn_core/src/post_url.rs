use url::Url;

use crate::{Error, Result};

/// Substrings a post URL must contain to be accepted.
pub const DOMAIN_MARKERS: &[&str] = &["threads.net", "threads.com"];

/// A validated post URL with the identifiers found in its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUrl {
    pub url: String,
    pub post_id: String,
    pub username: Option<String>,
}

/// Validates a raw post URL and extracts the post id and author handle.
///
/// Never touches the network. The domain check runs on the raw string so a
/// foreign URL is rejected before anything else is attempted.
pub fn parse_post_url(raw: &str) -> Result<PostUrl> {
    let raw = raw.trim();
    if !DOMAIN_MARKERS.iter().any(|marker| raw.contains(marker)) {
        return Err(Error::InvalidUrl(format!(
            "Not a Threads URL (expected one of {}): {}",
            DOMAIN_MARKERS.join(", "),
            raw
        )));
    }

    let parsed = Url::parse(raw)
        .map_err(|e| Error::InvalidUrl(format!("Failed to parse URL {}: {}", raw, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::InvalidUrl(format!(
            "Only http/https URLs are allowed, got: {}",
            parsed.scheme()
        )));
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let username = segments
        .iter()
        .find_map(|seg| seg.strip_prefix('@'))
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let post_id = segments
        .iter()
        .position(|seg| *seg == "post")
        .and_then(|i| segments.get(i + 1))
        .or_else(|| segments.last().filter(|seg| !seg.starts_with('@')))
        .map(|seg| seg.to_string())
        .ok_or_else(|| Error::InvalidUrl(format!("No post identifier in URL: {}", raw)))?;

    Ok(PostUrl {
        url: raw.to_string(),
        post_id,
        username,
    })
}
