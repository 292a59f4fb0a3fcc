use clap::Args;
use pn_core::{Error, Result};
use pn_storage::notion::DEFAULT_API_URL;
use pn_storage::{NotionConfig, PropertyNames};

/// Credentials and location of the destination database.
#[derive(Args, Debug, Clone, Default)]
pub struct NotionArgs {
    /// Notion integration token
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    pub notion_token: Option<String>,

    /// Alternative variable for the integration token
    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true, hide = true)]
    pub notion_api_key: Option<String>,

    /// Database records are written to
    #[arg(long, env = "NOTION_DATABASE_ID")]
    pub notion_database_id: Option<String>,

    /// Base URL of the Notion API
    #[arg(long, env = "NOTION_API_URL", default_value = DEFAULT_API_URL)]
    pub notion_api_url: String,

    /// Override a database property name, e.g. `title=Name` (repeatable)
    #[arg(
        long = "notion-property",
        env = "NOTION_PROPERTIES",
        value_name = "KEY=NAME",
        value_delimiter = ','
    )]
    pub notion_properties: Vec<String>,
}

impl NotionArgs {
    pub fn notion_config(&self) -> Result<NotionConfig> {
        let token = self
            .notion_token
            .as_deref()
            .or(self.notion_api_key.as_deref())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config("NOTION_TOKEN (or NOTION_API_KEY) is not set".to_string()))?;
        let database_id = self
            .notion_database_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::Config("NOTION_DATABASE_ID is not set".to_string()))?;

        Ok(NotionConfig::new(token, database_id)
            .with_api_url(self.notion_api_url.as_str())
            .with_properties(self.property_names()?))
    }

    fn property_names(&self) -> Result<PropertyNames> {
        let mut names = PropertyNames::default();
        for entry in &self.notion_properties {
            let (key, name) = entry
                .split_once('=')
                .map(|(key, name)| (key.trim(), name.trim()))
                .filter(|(_, name)| !name.is_empty())
                .ok_or_else(|| {
                    Error::Config(format!("Expected KEY=NAME for --notion-property, got {:?}", entry))
                })?;
            names.rename(key, name)?;
        }
        Ok(names)
    }
}
