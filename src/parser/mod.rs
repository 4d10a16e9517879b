// Feed document parsing

pub mod feed_parser;

pub use feed_parser::parse_feed;
