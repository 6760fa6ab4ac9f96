// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset};
use tracing::debug;
use url::Url;

use crate::error::FeedError;

/// Format of [`FeedEntry::date`]; lexical order equals chronological order
pub const DATE_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Date used for entries whose publish date is missing or unreadable
pub const UNDATED: &str = "19700101T000000";

/// A parsed podcast feed, ready to be stored
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub title: String,
    pub image_url: Option<Url>,
    pub entries: Vec<FeedEntry>,
}

/// One entry of a feed that carries an audio enclosure
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    /// GUID, or the enclosure URL when the feed has none
    pub iden: String,
    pub date: String,
    pub title: String,
    pub url: String,
    pub link: String,
    pub description: String,
}

/// Parse RSS feed XML bytes
///
/// Items without an enclosure are skipped.
pub fn parse_feed(xml_bytes: &[u8]) -> Result<FeedDocument, FeedError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    let entries = channel
        .items()
        .iter()
        .filter_map(|item| match parse_entry(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("skipping feed item: {e}");
                None
            }
        })
        .collect();

    let image_url = channel
        .image()
        .and_then(|img| Url::parse(img.url()).ok())
        .or_else(|| {
            channel
                .itunes_ext()
                .and_then(|ext| ext.image())
                .and_then(|url| Url::parse(url).ok())
        });

    Ok(FeedDocument {
        title: decode_text(channel.title()),
        image_url,
        entries,
    })
}

fn parse_entry(item: &rss::Item) -> Result<FeedEntry, FeedError> {
    let title = item
        .title()
        .map(decode_text)
        .unwrap_or_else(|| "Untitled Episode".to_string());

    let enclosure = item
        .enclosure()
        .ok_or_else(|| FeedError::MissingEnclosure {
            title: title.clone(),
        })?;

    let url = Url::parse(enclosure.url())?.to_string();

    let date = item
        .pub_date()
        .and_then(parse_date)
        .map(|dt| dt.naive_utc().format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| UNDATED.to_string());

    let iden = item
        .guid()
        .map(|g| g.value().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| url.clone());

    Ok(FeedEntry {
        iden,
        date,
        title,
        url,
        link: item.link().unwrap_or_default().to_string(),
        description: item.description().map(decode_text).unwrap_or_default(),
    })
}

fn parse_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
        return Some(dt);
    }

    let formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    formats
        .iter()
        .find_map(|format| DateTime::parse_from_str(date_str, format).ok())
}

fn decode_text(text: &str) -> String {
    html_escape::decode_html_entities(text.trim()).into_owned()
}
