// Extraction of raw offers from the auction feed document
use crate::model::{FetchError, RawOffer};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FeedDocument {
    server: Vec<RawOffer>,
}

/// Returns the records of the document's top-level `server` array, in feed order.
/// Records are left untyped; the normalizer judges each one separately.
pub fn parse_feed(document: &str) -> Result<Vec<RawOffer>, FetchError> {
    let feed: FeedDocument =
        serde_json::from_str(document).map_err(|e| FetchError::InvalidDocument(e.to_string()))?;
    Ok(feed.server)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_keeps_order_and_odd_records() {
        let doc = r#"{"server": [{"id": 2}, {"id": 1}, "broken"], "serverCount": 3}"#;
        let offers = parse_feed(doc).unwrap();
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0]["id"], 2);
        assert_eq!(offers[1]["id"], 1);
        assert!(offers[2].is_string());
    }

    #[test]
    fn test_parse_feed_requires_server_array() {
        assert!(matches!(parse_feed(r#"{"servers": []}"#), Err(FetchError::InvalidDocument(_))));
        assert!(matches!(parse_feed(r#"{"server": {}}"#), Err(FetchError::InvalidDocument(_))));
        assert!(matches!(parse_feed("<html>"), Err(FetchError::InvalidDocument(_))));
    }
}
