// Feed retrieval

pub mod fetcher;
pub mod traits;

pub use fetcher::{FeedFetcher, DEFAULT_FEED_URL};
pub use traits::FeedSource;
