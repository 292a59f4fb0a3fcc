use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pn_core::text::{split_content, ELLIPSIS};
use pn_core::{Error, Post, PostStore, Result};
use serde_json::{json, Value};
use tracing::{debug, info};

pub const DEFAULT_API_URL: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";

/// Category written to every record.
pub const CATEGORY: &str = "쓰레드";
/// Importance written to every record.
pub const IMPORTANCE: &str = "보통";
/// Where the original post was published.
pub const ORIGIN_SITE: &str = "쓰레드(Threads)";

/// Names of the database properties records are written to.
#[derive(Debug, Clone)]
pub struct PropertyNames {
    pub title: String,
    pub url: String,
    pub saved_at: String,
    pub category: String,
    pub author: String,
    pub origin_site: String,
    pub importance: String,
    pub author_name: String,
    pub post_id: String,
    pub content: String,
    pub published_at: String,
    pub likes: String,
    pub comments: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "제목".to_string(),
            url: "URL".to_string(),
            saved_at: "생성 일시".to_string(),
            category: "구분".to_string(),
            author: "원본 글 작성자".to_string(),
            origin_site: "최초 작성된 곳".to_string(),
            importance: "중요도".to_string(),
            author_name: "작성자 이름".to_string(),
            post_id: "게시물 ID".to_string(),
            content: "내용".to_string(),
            published_at: "작성 일시".to_string(),
            likes: "좋아요".to_string(),
            comments: "댓글".to_string(),
        }
    }
}

impl PropertyNames {
    /// Points one field (`title`, `url`, `saved_at`, `category`, `author`,
    /// `origin_site`, `importance`, `author_name`, `post_id`, `content`,
    /// `published_at`, `likes`, `comments`) at a differently named property.
    pub fn rename(&mut self, key: &str, name: impl Into<String>) -> Result<()> {
        let slot = match key {
            "title" => &mut self.title,
            "url" => &mut self.url,
            "saved_at" => &mut self.saved_at,
            "category" => &mut self.category,
            "author" => &mut self.author,
            "origin_site" => &mut self.origin_site,
            "importance" => &mut self.importance,
            "author_name" => &mut self.author_name,
            "post_id" => &mut self.post_id,
            "content" => &mut self.content,
            "published_at" => &mut self.published_at,
            "likes" => &mut self.likes,
            "comments" => &mut self.comments,
            other => {
                return Err(Error::Config(format!("Unknown Notion property key: {}", other)))
            }
        };
        *slot = name.into();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub token: String,
    pub database_id: String,
    pub api_url: String,
    pub properties: PropertyNames,
}

impl NotionConfig {
    pub fn new(token: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            database_id: database_id.into(),
            api_url: DEFAULT_API_URL.to_string(),
            properties: PropertyNames::default(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_properties(mut self, properties: PropertyNames) -> Self {
        self.properties = properties;
        self
    }
}

/// Client for the hosted Notion database that records are written to.
pub struct NotionStore {
    client: reqwest::Client,
    config: NotionConfig,
}

impl NotionStore {
    pub fn new(config: NotionConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(Error::Config("Notion token is empty".to_string()));
        }
        if config.database_id.trim().is_empty() {
            return Err(Error::Config("Notion database id is empty".to_string()));
        }
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &NotionConfig {
        &self.config
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let endpoint = format!("{}{}", self.config.api_url, path);
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Upsert(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Upsert(format!(
                "{}: {}",
                status.as_u16(),
                api_error_message(&text)
            )));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl PostStore for NotionStore {
    fn name(&self) -> &str {
        "notion"
    }

    async fn find_existing(&self, post: &Post) -> Result<Option<String>> {
        let body = query_body(post, &self.config.properties);
        let path = format!("/v1/databases/{}/query", self.config.database_id);
        let response = self.post_json(&path, &body).await?;

        let id = response
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .and_then(|page| page.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        debug!(url = %post.url, existing = ?id, "Queried Notion for existing record");
        Ok(id)
    }

    async fn create(&self, post: &Post) -> Result<String> {
        let body = page_body(post, &self.config, Utc::now());
        let response = self.post_json("/v1/pages", &body).await?;

        let id = response
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Upsert("Notion response is missing the page id".to_string()))?;
        info!(url = %post.url, id = %id, "Created Notion page");
        Ok(id)
    }
}

/// Pulls the human-readable message out of a Notion error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn rich_text(content: &str) -> Value {
    json!([{ "text": { "content": content } }])
}

/// Rich text for post content; a cut-off tail gets the ellipsis in its own
/// run so no single run exceeds the API's length limit.
fn content_rich_text(content: &str) -> Value {
    match split_content(content) {
        (head, true) => json!([
            { "text": { "content": head } },
            { "text": { "content": ELLIPSIS } }
        ]),
        (head, false) => rich_text(head),
    }
}

pub fn record_title(post: &Post, saved_at: DateTime<Utc>) -> String {
    format!(
        "{}의 쓰레드 ({})",
        post.author.username,
        saved_at.format("%Y-%m-%d")
    )
}

pub fn query_body(post: &Post, names: &PropertyNames) -> Value {
    let by_url = json!({ "property": names.url, "url": { "equals": post.url } });
    let filter = if post.is_rendered() {
        json!({
            "or": [
                by_url,
                { "property": names.post_id, "rich_text": { "equals": post.id } }
            ]
        })
    } else {
        by_url
    };

    json!({ "filter": filter, "page_size": 1 })
}

pub fn page_properties(post: &Post, names: &PropertyNames, saved_at: DateTime<Utc>) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        names.title.clone(),
        json!({ "title": rich_text(&record_title(post, saved_at)) }),
    );
    properties.insert(names.url.clone(), json!({ "url": post.url }));
    properties.insert(
        names.saved_at.clone(),
        json!({ "date": { "start": saved_at.to_rfc3339() } }),
    );
    properties.insert(names.category.clone(), json!({ "select": { "name": CATEGORY } }));
    properties.insert(
        names.author.clone(),
        json!({ "rich_text": rich_text(&post.author.username) }),
    );
    properties.insert(
        names.origin_site.clone(),
        json!({ "rich_text": rich_text(ORIGIN_SITE) }),
    );
    properties.insert(
        names.importance.clone(),
        json!({ "select": { "name": IMPORTANCE } }),
    );

    if post.is_rendered() {
        properties.insert(
            names.author_name.clone(),
            json!({ "rich_text": rich_text(&post.author.name) }),
        );
        properties.insert(
            names.post_id.clone(),
            json!({ "rich_text": rich_text(&post.id) }),
        );
        properties.insert(
            names.content.clone(),
            json!({ "rich_text": content_rich_text(&post.content) }),
        );
        properties.insert(
            names.published_at.clone(),
            json!({ "date": { "start": post.timestamp.to_rfc3339() } }),
        );
        properties.insert(names.likes.clone(), json!({ "number": post.likes }));
        properties.insert(names.comments.clone(), json!({ "number": post.comments }));
    }

    Value::Object(properties)
}

pub fn image_blocks(post: &Post) -> Vec<Value> {
    post.image_urls
        .iter()
        .map(|url| {
            json!({
                "object": "block",
                "type": "image",
                "image": { "type": "external", "external": { "url": url } }
            })
        })
        .collect()
}

pub fn page_body(post: &Post, config: &NotionConfig, saved_at: DateTime<Utc>) -> Value {
    let mut body = json!({
        "parent": { "database_id": config.database_id },
        "properties": page_properties(post, &config.properties, saved_at),
    });
    let children = image_blocks(post);
    if !children.is_empty() {
        body["children"] = Value::Array(children);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pn_core::text::MAX_CONTENT_CHARS;
    use pn_core::{parse_post_url, PostOrigin};

    fn url_post() -> Post {
        let parsed = parse_post_url("https://www.threads.net/@alice/post/XYZ123").unwrap();
        Post::from_url(&parsed, Utc::now())
    }

    fn rendered_post() -> Post {
        let mut post = url_post();
        post.origin = PostOrigin::Rendered;
        post.author.name = "Alice Kim".to_string();
        post.content = "hello threads".to_string();
        post.image_urls = vec![
            "https://cdn.example/a.jpg".to_string(),
            "https://cdn.example/b.jpg".to_string(),
        ];
        post.likes = 12;
        post.comments = 3;
        post
    }

    fn saved_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_record_title() {
        assert_eq!(record_title(&url_post(), saved_at()), "alice의 쓰레드 (2024-03-05)");
    }

    #[test]
    fn test_query_filters_by_url_only_for_url_posts() {
        let body = query_body(&url_post(), &PropertyNames::default());
        assert_eq!(body["page_size"], 1);
        assert_eq!(body["filter"]["property"], "URL");
        assert_eq!(
            body["filter"]["url"]["equals"],
            "https://www.threads.net/@alice/post/XYZ123"
        );
    }

    #[test]
    fn test_query_adds_post_id_for_rendered_posts() {
        let body = query_body(&rendered_post(), &PropertyNames::default());
        let or = body["filter"]["or"].as_array().unwrap();
        assert_eq!(or.len(), 2);
        assert_eq!(or[1]["property"], "게시물 ID");
        assert_eq!(or[1]["rich_text"]["equals"], "XYZ123");
    }

    #[test]
    fn test_url_post_writes_base_properties() {
        let props = page_properties(&url_post(), &PropertyNames::default(), saved_at());
        let props = props.as_object().unwrap();
        assert_eq!(props.len(), 7);
        assert_eq!(props["구분"]["select"]["name"], CATEGORY);
        assert_eq!(props["중요도"]["select"]["name"], IMPORTANCE);
        assert_eq!(props["원본 글 작성자"]["rich_text"][0]["text"]["content"], "alice");
        assert_eq!(props["생성 일시"]["date"]["start"], "2024-03-05T09:30:00+00:00");
        assert!(props.get("내용").is_none());
    }

    #[test]
    fn test_rendered_post_writes_details() {
        let props = page_properties(&rendered_post(), &PropertyNames::default(), saved_at());
        assert_eq!(props["좋아요"]["number"], 12);
        assert_eq!(props["댓글"]["number"], 3);
        assert_eq!(props["작성자 이름"]["rich_text"][0]["text"]["content"], "Alice Kim");
        assert_eq!(props["내용"]["rich_text"][0]["text"]["content"], "hello threads");
    }

    #[test]
    fn test_long_content_split_into_runs() {
        let mut post = rendered_post();
        post.content = "a".repeat(MAX_CONTENT_CHARS + 500);
        let props = page_properties(&post, &PropertyNames::default(), saved_at());
        let runs = props["내용"]["rich_text"].as_array().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(
            runs[0]["text"]["content"].as_str().unwrap().chars().count(),
            MAX_CONTENT_CHARS
        );
        assert_eq!(runs[1]["text"]["content"], ELLIPSIS);
    }

    #[test]
    fn test_page_body_images_become_blocks() {
        let config = NotionConfig::new("secret", "db-1");
        let body = page_body(&rendered_post(), &config, saved_at());
        assert_eq!(body["parent"]["database_id"], "db-1");
        let children = body["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["image"]["external"]["url"], "https://cdn.example/a.jpg");

        let body = page_body(&url_post(), &config, saved_at());
        assert!(body.get("children").is_none());
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"object":"error","status":400,"code":"validation_error","message":"URL is not a property that exists."}"#;
        assert_eq!(api_error_message(body), "URL is not a property that exists.");
        assert_eq!(api_error_message("bad gateway"), "bad gateway");
    }

    #[test]
    fn test_store_requires_credentials() {
        assert!(matches!(
            NotionStore::new(NotionConfig::new("", "db")),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            NotionStore::new(NotionConfig::new("token", " ")),
            Err(Error::Config(_))
        ));
        let store = NotionStore::new(
            NotionConfig::new("token", "db").with_api_url("http://localhost:9999/"),
        )
        .unwrap();
        assert_eq!(store.config().api_url, "http://localhost:9999");
    }

    #[test]
    fn test_rename_property() {
        let mut names = PropertyNames::default();
        names.rename("post_id", "Post ID").unwrap();
        assert_eq!(names.post_id, "Post ID");
        assert!(matches!(names.rename("colour", "Red"), Err(Error::Config(_))));

        let config = NotionConfig::new("secret", "db-1").with_properties(names);
        let body = query_body(&rendered_post(), &config.properties);
        assert_eq!(body["filter"]["or"][1]["property"], "Post ID");
    }

    mod api {
        use super::*;
        use axum::extract::{Path, State};
        use axum::http::{HeaderMap, StatusCode};
        use axum::routing::post;
        use axum::{Json, Router};
        use std::sync::{Arc, Mutex};

        #[derive(Clone)]
        struct FakeNotion {
            query: (StatusCode, Value),
            create: (StatusCode, Value),
            requests: Arc<Mutex<Vec<(String, HeaderMap, Value)>>>,
        }

        impl FakeNotion {
            fn new(query: (StatusCode, Value), create: (StatusCode, Value)) -> Self {
                Self {
                    query,
                    create,
                    requests: Arc::default(),
                }
            }

            fn requests(&self) -> Vec<(String, HeaderMap, Value)> {
                self.requests.lock().unwrap().clone()
            }

            /// Serves the fake API on an ephemeral port and returns a store pointed at it.
            async fn serve(&self) -> NotionStore {
                async fn query(
                    State(fake): State<FakeNotion>,
                    Path(database_id): Path<String>,
                    headers: HeaderMap,
                    Json(body): Json<Value>,
                ) -> (StatusCode, Json<Value>) {
                    let path = format!("/v1/databases/{}/query", database_id);
                    fake.requests.lock().unwrap().push((path, headers, body));
                    (fake.query.0, Json(fake.query.1.clone()))
                }

                async fn create(
                    State(fake): State<FakeNotion>,
                    headers: HeaderMap,
                    Json(body): Json<Value>,
                ) -> (StatusCode, Json<Value>) {
                    fake.requests
                        .lock()
                        .unwrap()
                        .push(("/v1/pages".to_string(), headers, body));
                    (fake.create.0, Json(fake.create.1.clone()))
                }

                let app = Router::new()
                    .route("/v1/databases/:database_id/query", post(query))
                    .route("/v1/pages", post(create))
                    .with_state(self.clone());
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                let addr = listener.local_addr().unwrap();
                tokio::spawn(async move {
                    axum::serve(listener, app).await.unwrap();
                });

                NotionStore::new(
                    NotionConfig::new("secret-token", "db-1").with_api_url(format!("http://{}", addr)),
                )
                .unwrap()
            }
        }

        fn ok(body: Value) -> (StatusCode, Value) {
            (StatusCode::OK, body)
        }

        #[tokio::test]
        async fn test_existing_page_is_found() {
            let fake = FakeNotion::new(
                ok(json!({ "object": "list", "results": [{ "id": "page-1" }, { "id": "page-2" }] })),
                ok(json!({ "id": "unused" })),
            );
            let store = fake.serve().await;

            let existing = store.find_existing(&url_post()).await.unwrap();
            assert_eq!(existing.as_deref(), Some("page-1"));

            let requests = fake.requests();
            assert_eq!(requests.len(), 1);
            let (path, headers, body) = &requests[0];
            assert_eq!(path, "/v1/databases/db-1/query");
            assert_eq!(headers["authorization"], "Bearer secret-token");
            assert_eq!(headers["notion-version"], NOTION_VERSION);
            assert_eq!(body["filter"]["url"]["equals"], url_post().url);
        }

        #[tokio::test]
        async fn test_miss_then_create() {
            let fake = FakeNotion::new(
                ok(json!({ "object": "list", "results": [] })),
                ok(json!({ "object": "page", "id": "page-9" })),
            );
            let store = fake.serve().await;
            let post = rendered_post();

            assert_eq!(store.find_existing(&post).await.unwrap(), None);
            assert_eq!(store.create(&post).await.unwrap(), "page-9");

            let requests = fake.requests();
            assert_eq!(requests.len(), 2);
            let (path, headers, body) = &requests[1];
            assert_eq!(path, "/v1/pages");
            assert_eq!(headers["notion-version"], NOTION_VERSION);
            assert_eq!(body["parent"]["database_id"], "db-1");
            assert_eq!(body["properties"]["좋아요"]["number"], 12);
            assert_eq!(body["children"].as_array().unwrap().len(), 2);
        }

        #[tokio::test]
        async fn test_error_status_becomes_upsert_error() {
            let fake = FakeNotion::new(
                (
                    StatusCode::UNAUTHORIZED,
                    json!({ "object": "error", "status": 401, "message": "API token is invalid." }),
                ),
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "object": "error", "status": 400, "message": "bad prop" }),
                ),
            );
            let store = fake.serve().await;

            match store.find_existing(&url_post()).await {
                Err(Error::Upsert(message)) => assert_eq!(message, "401: API token is invalid."),
                other => panic!("expected upsert error, got {:?}", other),
            }
            match store.create(&url_post()).await {
                Err(Error::Upsert(message)) => assert_eq!(message, "400: bad prop"),
                other => panic!("expected upsert error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_create_without_id_fails() {
            let fake = FakeNotion::new(
                ok(json!({ "results": [] })),
                ok(json!({ "object": "page" })),
            );
            let store = fake.serve().await;

            assert!(matches!(store.create(&url_post()).await, Err(Error::Upsert(_))));
        }
    }
}
