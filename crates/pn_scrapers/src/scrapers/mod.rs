use async_trait::async_trait;
use pn_core::{Post, PostUrl, Result};

pub mod jsonld;
pub mod threads;
pub mod url_only;

pub use threads::RenderedFetcher;
pub use url_only::UrlOnlyFetcher;

/// The pluggable "fetch metadata" step of an import.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Short name of the fetcher, used in logs and health output
    fn name(&self) -> &str;

    /// Builds the post for an already validated URL
    async fn fetch(&self, url: &PostUrl) -> Result<Post>;
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use pn_core::{Error, Result};
    use scraper::{ElementRef, Html, Selector};

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| Error::Scraping(format!("Invalid selector {}: {}", css, e)))
    }

    /// Trimmed text of the first element matching `css`, if it has any.
    pub fn extract_text(document: &Html, css: &str) -> Result<Option<String>> {
        let selector = selector(css)?;
        Ok(document
            .select(&selector)
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .find(|text| !text.is_empty()))
    }

    /// Content of the first `<meta>` whose `property` or `name` is `key`.
    pub fn meta_content(document: &Html, key: &str) -> Result<Option<String>> {
        let selector = selector(&format!(r#"meta[property="{key}"], meta[name="{key}"]"#))?;
        Ok(document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(|content| content.trim().to_string())
            .find(|content| !content.is_empty()))
    }

    /// Nearest ancestor (or the element itself) with `role="button"`.
    pub fn enclosing_button(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
        std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .find(|el| el.value().attr("role") == Some("button") || el.value().name() == "button")
    }

    /// Collapses runs of spaces and tabs while keeping line breaks.
    pub fn normalize_whitespace(text: &str) -> String {
        text.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}
