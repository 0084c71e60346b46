mod fetcher;
pub mod identity;
mod opml_import;

pub use fetcher::{collapse_whitespace, parse_feed, to_plain_text, FeedEntry, FeedFetcher, FetchedFeed};
pub use identity::{image_url, item_id};
pub use opml_import::{parse_opml, parse_opml_file};
