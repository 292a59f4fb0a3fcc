pub mod cli;
pub mod importer;
pub mod logging;
pub mod render;
pub mod scrapers;

pub use cli::{build_fetcher, FetchArgs, FetchMode};
pub use importer::Importer;
pub use logging::init_logging;
pub use render::{BrowserlessRenderer, ChromeRenderer, PageRenderer};
pub use scrapers::{MetadataFetcher, RenderedFetcher, UrlOnlyFetcher};

pub mod prelude {
    pub use super::scrapers::MetadataFetcher;
    pub use super::Importer;
    pub use pn_core::{Error, ImportOutcome, Post, Result};
}
