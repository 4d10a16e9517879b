use crate::model::FetchError;

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns the raw feed document found at `location`.
    async fn fetch(&self, location: &str) -> Result<String, FetchError>;
}
