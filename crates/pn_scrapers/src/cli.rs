use clap::{Args, ValueEnum};
use pn_core::{Error, Result};
use std::fmt;
use std::sync::Arc;

use crate::render::{BrowserlessRenderer, ChromeRenderer};
use crate::scrapers::{MetadataFetcher, RenderedFetcher, UrlOnlyFetcher};

/// How post metadata is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FetchMode {
    /// Parse the URL only; no network access
    #[default]
    Url,
    /// Render the page with a local headless Chromium
    Chrome,
    /// Render the page through a Browserless service
    Browserless,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Url => write!(f, "url"),
            FetchMode::Chrome => write!(f, "chrome"),
            FetchMode::Browserless => write!(f, "browserless"),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// How to obtain post metadata
    #[arg(long = "fetch", env = "PN_FETCH", value_enum, default_value_t = FetchMode::Url)]
    pub mode: FetchMode,

    /// Chromium binary used by the chrome fetch mode
    #[arg(long, env = "CHROME_BIN", default_value = "chromium")]
    pub chrome_bin: String,

    /// Base URL of the Browserless service
    #[arg(long, env = "BROWSERLESS_URL")]
    pub browserless_url: Option<String>,

    /// Browserless API token
    #[arg(long, env = "BROWSERLESS_TOKEN", hide_env_values = true)]
    pub browserless_token: Option<String>,
}

impl Default for FetchArgs {
    fn default() -> Self {
        Self {
            mode: FetchMode::Url,
            chrome_bin: "chromium".to_string(),
            browserless_url: None,
            browserless_token: None,
        }
    }
}

pub fn build_fetcher(args: &FetchArgs) -> Result<Arc<dyn MetadataFetcher>> {
    let fetcher: Arc<dyn MetadataFetcher> = match args.mode {
        FetchMode::Url => Arc::new(UrlOnlyFetcher::new()),
        FetchMode::Chrome => Arc::new(RenderedFetcher::new(Arc::new(ChromeRenderer::new(
            args.chrome_bin.clone(),
        )))),
        FetchMode::Browserless => {
            let base_url = args.browserless_url.as_deref().ok_or_else(|| {
                Error::Config("BROWSERLESS_URL is required for the browserless fetch mode".to_string())
            })?;
            let renderer = BrowserlessRenderer::new(base_url, args.browserless_token.as_deref())?;
            Arc::new(RenderedFetcher::new(Arc::new(renderer)))
        }
    };
    Ok(fetcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fetcher() {
        let fetcher = build_fetcher(&FetchArgs::default()).unwrap();
        assert_eq!(fetcher.name(), "url");

        let args = FetchArgs {
            mode: FetchMode::Chrome,
            ..FetchArgs::default()
        };
        assert_eq!(build_fetcher(&args).unwrap().name(), "chrome");
    }

    #[test]
    fn test_browserless_requires_url() {
        let mut args = FetchArgs {
            mode: FetchMode::Browserless,
            ..FetchArgs::default()
        };
        assert!(matches!(build_fetcher(&args), Err(Error::Config(_))));

        args.browserless_url = Some("http://localhost:3000".to_string());
        assert_eq!(build_fetcher(&args).unwrap().name(), "browserless");
    }
}
