// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::warn;
use url::Url;

use crate::error::FeedError;
use crate::http::HttpClient;

use super::parse::{FeedDocument, parse_feed};

/// Fetch and parse a podcast feed from a URL
pub async fn fetch_feed<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<FeedDocument, FeedError> {
    Url::parse(url)?;

    let document = client
        .get_bytes(url)
        .await
        .map_err(|e| FeedError::FetchFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !document.is_success() {
        return Err(FeedError::HttpStatus {
            url: url.to_string(),
            status: document.status,
        });
    }

    parse_feed(&document.body)
}

/// Download a cover image and return it base64-encoded
///
/// Cover art is decorative: failures are logged and yield `None`.
pub async fn fetch_image_base64<C: HttpClient + ?Sized>(client: &C, url: &Url) -> Option<String> {
    match client.get_bytes(url.as_str()).await {
        Ok(document) if document.is_success() && !document.body.is_empty() => {
            Some(BASE64.encode(&document.body))
        }
        Ok(document) => {
            warn!("cover image {url} returned HTTP {}", document.status);
            None
        }
        Err(e) => {
            warn!("failed to fetch cover image {url}: {e}");
            None
        }
    }
}

/// Determine if a string looks like a feed URL
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
