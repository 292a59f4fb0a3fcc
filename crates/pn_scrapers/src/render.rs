use async_trait::async_trait;
use pn_core::{Error, Result};
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound for loading and rendering one page.
pub const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Mobile Safari user-agent; the mobile site carries the post metadata in
/// server-rendered markup.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

/// Produces the fully rendered DOM of a page.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    fn name(&self) -> &str;

    async fn render(&self, url: &str, user_agent: &str) -> Result<String>;
}

/// Renders pages with a local headless Chromium (`--dump-dom`).
///
/// Each call starts a fresh browser in a throwaway profile directory. The
/// process is killed if the render future is dropped, including on timeout,
/// and the profile directory is removed when the call returns.
pub struct ChromeRenderer {
    chrome_bin: String,
    timeout: Duration,
}

impl ChromeRenderer {
    pub fn new(chrome_bin: impl Into<String>) -> Self {
        Self {
            chrome_bin: chrome_bin.into(),
            timeout: RENDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn args(url: &str, user_agent: &str, profile_dir: &std::path::Path) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--user-agent={}", user_agent),
            format!("--user-data-dir={}", profile_dir.display()),
            // lets pending network requests settle before the DOM is dumped
            "--virtual-time-budget=10000".to_string(),
            "--dump-dom".to_string(),
            url.to_string(),
        ]
    }
}

impl Default for ChromeRenderer {
    fn default() -> Self {
        Self::new("chromium")
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    fn name(&self) -> &str {
        "chrome"
    }

    async fn render(&self, url: &str, user_agent: &str) -> Result<String> {
        let profile = tempfile::tempdir()
            .map_err(|e| Error::Scraping(format!("Failed to create browser profile dir: {}", e)))?;

        info!(url, browser = %self.chrome_bin, "Launching headless browser");
        let child = tokio::process::Command::new(&self.chrome_bin)
            .args(Self::args(url, user_agent, profile.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Scraping(format!("Failed to launch {}: {}", self.chrome_bin, e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(url, "Browser navigation timed out");
                Error::Scraping(format!("Navigation to {} timed out after {:?}", url, self.timeout))
            })?
            .map_err(|e| Error::Scraping(format!("Browser failed for {}: {}", url, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Scraping(format!(
                "Browser exited with {} for {}: {}",
                output.status,
                url,
                stderr.trim()
            )));
        }

        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            return Err(Error::Scraping(format!("Browser returned an empty DOM for {}", url)));
        }
        debug!(url, bytes = html.len(), "Rendered page");
        Ok(html)
    }
}

/// Renders pages through a Browserless `/content` endpoint.
pub struct BrowserlessRenderer {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessRenderer {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(RENDER_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    fn request(&self, url: &str, user_agent: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.post(format!("{}/content", self.base_url));
        if let Some(ref token) = self.token {
            request = request.query(&[("token", token)]);
        }
        request.json(&serde_json::json!({
            "url": url,
            "userAgent": user_agent,
            "gotoOptions": {
                "waitUntil": "networkidle0",
                "timeout": RENDER_TIMEOUT.as_millis() as u64,
            },
        }))
    }
}

#[async_trait]
impl PageRenderer for BrowserlessRenderer {
    fn name(&self) -> &str {
        "browserless"
    }

    async fn render(&self, url: &str, user_agent: &str) -> Result<String> {
        info!(url, "Rendering page via Browserless");
        let resp = self
            .request(url, user_agent)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Scraping(format!(
                        "Navigation to {} timed out after {:?}",
                        url, RENDER_TIMEOUT
                    ))
                } else {
                    Error::Scraping(format!("Browserless request failed: {}", e))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Scraping(format!(
                "Browserless error (status {}): {}",
                status.as_u16(),
                message
            )));
        }

        resp.text()
            .await
            .map_err(|e| Error::Scraping(format!("Failed to read rendered page: {}", e)))
    }
}
