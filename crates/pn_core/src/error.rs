use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Upsert error: {0}")]
    Upsert(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A record for the same post already exists; carries its identifier.
    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True for failures caused by the caller's input rather than by a
    /// downstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidUrl(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
