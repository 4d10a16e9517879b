use crate::model::FetchError;
use crate::scraper::FeedSource;

use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_FEED_URL: &str =
    "https://www.hetzner.com/_resources/app/jsondata/live_data_sb.json";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15";

/// Fetches the feed over HTTP(S), or from disk for `file://` URLs and plain paths.
pub struct FeedFetcher {
    pub client: Client,
}

impl FeedFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client })
    }
}

/// Local path of a feed location, if it is not an HTTP(S) URL.
fn local_path(location: &str) -> Option<&Path> {
    if let Some(path) = location.strip_prefix("file://") {
        return Some(Path::new(path));
    }
    if location.starts_with("http://") || location.starts_with("https://") {
        None
    } else {
        Some(Path::new(location))
    }
}

#[async_trait::async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, location: &str) -> Result<String, FetchError> {
        if let Some(path) = local_path(location) {
            debug!("Reading feed from {}", path.display());
            return Ok(tokio::fs::read_to_string(path).await?);
        }

        debug!("Downloading feed from {}", location);
        let response = self.client.get(location).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        Ok(response.text().await?)
    }
}
