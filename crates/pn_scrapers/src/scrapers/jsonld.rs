use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde_json::Value;

/// Fields of a schema.org `SocialMediaPosting` found in JSON-LD metadata.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Posting {
    pub author_name: Option<String>,
    pub author_handle: Option<String>,
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub images: Vec<String>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
}

/// Extracts the first social media posting from JSON-LD metadata in the
/// HTML document.
pub fn extract_posting(document: &Html) -> Option<Posting> {
    let script_selector = Selector::parse("script[type='application/ld+json']").ok()?;

    document
        .select(&script_selector)
        .filter_map(|script| {
            serde_json::from_str::<Value>(script.text().collect::<String>().trim()).ok()
        })
        .flat_map(|json| match json {
            Value::Array(items) => items,
            // A @graph wrapper holds several nodes
            Value::Object(ref obj) if obj.contains_key("@graph") => obj["@graph"]
                .as_array()
                .cloned()
                .unwrap_or_default(),
            other => vec![other],
        })
        .find(is_posting)
        .map(|node| to_posting(&node))
}

fn is_posting(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == "SocialMediaPosting" || t == "DiscussionForumPosting",
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t == "SocialMediaPosting" || t == "DiscussionForumPosting"),
        _ => false,
    }
}

fn to_posting(node: &Value) -> Posting {
    let author = match node.get("author") {
        Some(Value::Array(arr)) => arr.first(),
        other => other,
    };

    let (author_name, author_handle) = match author {
        Some(Value::Object(obj)) => (
            obj.get("name").and_then(Value::as_str).map(|s| s.trim().to_string()),
            obj.get("alternateName")
                .or_else(|| obj.get("identifier"))
                .and_then(Value::as_str)
                .map(|s| s.trim().trim_start_matches('@').to_string()),
        ),
        Some(Value::String(s)) => (Some(s.trim().to_string()), None),
        _ => (None, None),
    };

    let images = match node.get("image") {
        Some(Value::String(url)) => vec![url.clone()],
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|img| {
                img.as_str()
                    .or_else(|| img.get("url").and_then(Value::as_str))
                    .map(str::to_string)
            })
            .collect(),
        Some(Value::Object(obj)) => obj
            .get("url")
            .and_then(Value::as_str)
            .map(|url| vec![url.to_string()])
            .unwrap_or_default(),
        _ => vec![],
    };

    Posting {
        author_name: author_name.filter(|s| !s.is_empty()),
        author_handle: author_handle.filter(|s| !s.is_empty()),
        body: node
            .get("articleBody")
            .or_else(|| node.get("text"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        published_at: node
            .get("datePublished")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        images,
        likes: interaction_count(node, "LikeAction"),
        comments: interaction_count(node, "CommentAction")
            .or_else(|| node.get("commentCount").and_then(Value::as_u64)),
    }
}

fn interaction_count(node: &Value, action: &str) -> Option<u64> {
    let stats = match node.get("interactionStatistic")? {
        Value::Array(arr) => arr.clone(),
        other => vec![other.clone()],
    };

    stats.iter().find_map(|stat| {
        let kind = stat.get("interactionType").and_then(|t| {
            t.as_str()
                .or_else(|| t.get("@type").and_then(Value::as_str))
        })?;
        if !kind.ends_with(action) {
            return None;
        }
        match stat.get("userInteractionCount")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => Some(pn_core::text::parse_count(s)),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_posting() {
        let html = r#"
            <script type="application/ld+json">{"@type":"WebSite","name":"Threads"}</script>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "SocialMediaPosting",
                "author": {"@type": "Person", "name": "Alice Kim", "alternateName": "@alice"},
                "articleBody": "  hello world  ",
                "datePublished": "2024-03-01T12:00:00+09:00",
                "image": [{"url": "https://cdn.example/1.jpg"}, "https://cdn.example/2.jpg"],
                "interactionStatistic": [
                    {"@type": "InteractionCounter", "interactionType": "https://schema.org/LikeAction", "userInteractionCount": 42},
                    {"@type": "InteractionCounter", "interactionType": {"@type": "CommentAction"}, "userInteractionCount": "1.5K"}
                ]
            }
            </script>
        "#;
        let document = Html::parse_document(html);
        let posting = extract_posting(&document).unwrap();

        assert_eq!(posting.author_name.as_deref(), Some("Alice Kim"));
        assert_eq!(posting.author_handle.as_deref(), Some("alice"));
        assert_eq!(posting.body.as_deref(), Some("hello world"));
        assert_eq!(
            posting.published_at.unwrap().to_rfc3339(),
            "2024-03-01T03:00:00+00:00"
        );
        assert_eq!(posting.images.len(), 2);
        assert_eq!(posting.likes, Some(42));
        assert_eq!(posting.comments, Some(15));
    }

    #[test]
    fn test_no_posting() {
        let document = Html::parse_document(
            r#"<script type="application/ld+json">{"@type":"WebSite"}</script>"#,
        );
        assert!(extract_posting(&document).is_none());

        let document = Html::parse_document(r#"<script type="application/ld+json">not json</script>"#);
        assert!(extract_posting(&document).is_none());
    }
}
