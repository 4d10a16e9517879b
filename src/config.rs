use crate::model::ConfigError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Optional JSON config: provider credentials and criteria keyed by field name.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub discord_webhook_url: Option<String>,
    #[serde(default, rename = "match")]
    pub match_criteria: Map<String, Value>,
    #[serde(default, rename = "exclude")]
    pub exclude_criteria: Map<String, Value>,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
