mod fetch;
mod parse;

pub use fetch::{fetch_feed, fetch_image_base64, is_url};
pub use parse::{DATE_FORMAT, FeedDocument, FeedEntry, UNDATED, parse_feed};
