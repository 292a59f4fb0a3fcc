use pn_core::{Error, Result};
use pn_scrapers::Importer;
use std::sync::Arc;

pub struct AppState {
    importer: Option<Arc<Importer>>,
    startup_error: Option<String>,
}

impl AppState {
    pub fn new(importer: Importer) -> Self {
        Self {
            importer: Some(Arc::new(importer)),
            startup_error: None,
        }
    }

    /// State for a server that started without a usable importer; every
    /// import request fails with the startup error until redeployed.
    pub fn unconfigured(error: &Error) -> Self {
        let message = match error {
            Error::Config(message) => message.clone(),
            other => other.to_string(),
        };
        Self {
            importer: None,
            startup_error: Some(message),
        }
    }

    pub fn importer(&self) -> Result<&Importer> {
        self.importer.as_deref().ok_or_else(|| {
            Error::Config(
                self.startup_error
                    .clone()
                    .unwrap_or_else(|| "Importer is not configured".to_string()),
            )
        })
    }

    pub fn is_configured(&self) -> bool {
        self.importer.is_some()
    }
}
