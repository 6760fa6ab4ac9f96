// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription management: the network side of feeds and tracks.

use std::path::Path;

use tracing::{info, warn};

use crate::download::remove_local_file;
use crate::error::LibraryError;
use crate::feed::{fetch_feed, fetch_image_base64};
use crate::http::HttpClient;
use crate::storage::Storage;

pub struct Library<'a> {
    client: &'a dyn HttpClient,
    storage: &'a dyn Storage,
    podcasts_dir: &'a Path,
}

impl<'a> Library<'a> {
    pub fn new(client: &'a dyn HttpClient, storage: &'a dyn Storage, podcasts_dir: &'a Path) -> Self {
        Self {
            client,
            storage,
            podcasts_dir,
        }
    }

    /// Subscribe to a feed and store its current episodes
    pub async fn subscribe(&self, url: &str) -> Result<i64, LibraryError> {
        if self.storage.get_feed_id(url).is_some() {
            return Err(LibraryError::AlreadySubscribed(url.to_string()));
        }

        let document = fetch_feed(self.client, url).await?;
        let image = match &document.image_url {
            Some(image_url) => fetch_image_base64(self.client, image_url).await,
            None => None,
        };

        let feed_id = self
            .storage
            .insert_feed(url, &document.title, image.as_deref())
            .ok_or_else(|| LibraryError::AlreadySubscribed(document.title.clone()))?;
        let added = self.storage.insert_tracks(feed_id, &document.entries, None);

        info!("subscribed to '{}' with {added} episodes", document.title);
        Ok(feed_id)
    }

    /// Fetch a feed again and store episodes newer than the latest known one
    pub async fn refresh(&self, feed_id: i64) -> Result<usize, LibraryError> {
        let feed = self
            .storage
            .get_feed(feed_id)
            .ok_or(LibraryError::UnknownFeed(feed_id))?;
        let document = fetch_feed(self.client, &feed.url).await?;

        let newest = self
            .storage
            .get_last_track_from_feed(feed_id)
            .map(|track| track.date);
        let added = self
            .storage
            .insert_tracks(feed_id, &document.entries, newest.as_deref());

        info!("'{}': {added} new episodes", feed.title);
        Ok(added)
    }

    /// Refresh every feed; failures are logged and skipped
    pub async fn refresh_all(&self) -> usize {
        let mut added = 0;
        for feed in self.storage.get_feeds() {
            match self.refresh(feed.id).await {
                Ok(count) => added += count,
                Err(e) => warn!("failed to refresh '{}': {e}", feed.title),
            }
        }
        added
    }

    /// Remove a feed, its episodes and their downloaded files
    pub fn unsubscribe(&self, feed_id: i64) -> bool {
        for track in self.storage.get_tracks_from_feed(feed_id) {
            if let Some(filename) = track.filename.as_deref() {
                remove_local_file(&self.podcasts_dir.join(filename));
            }
        }
        let removed = self.storage.remove_feed(feed_id);
        if removed {
            info!("unsubscribed from feed {feed_id}");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use crate::test_support::MockHttpClient;
    use tempfile::tempdir;

    const FEED_URL: &str = "https://example.com/feed.xml";

    fn feed_xml(items: &[(&str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(guid, date)| {
                format!(
                    "<item><title>Episode {guid}</title><guid>{guid}</guid>\
                     <pubDate>{date}</pubDate>\
                     <enclosure url=\"https://example.com/{guid}.mp3\" type=\"audio/mpeg\"/></item>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel>\
             <title>Example Show</title><description>d</description>\
             <image><url>https://example.com/cover.png</url><title>c</title><link>https://example.com</link></image>\
             {items}</channel></rss>"
        )
    }

    #[tokio::test]
    async fn subscribe_stores_feed_cover_and_episodes() {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let client = MockHttpClient::new()
            .with_document(
                FEED_URL,
                &feed_xml(&[
                    ("one", "Mon, 01 Jan 2024 10:00:00 +0000"),
                    ("two", "Tue, 02 Jan 2024 10:00:00 +0000"),
                ]),
            )
            .with_document("https://example.com/cover.png", "PNG");
        let library = Library::new(&client, &db, dir.path());

        let feed_id = library.subscribe(FEED_URL).await.unwrap();

        let feed = db.get_feed(feed_id).unwrap();
        assert_eq!(feed.title, "Example Show");
        assert_eq!(feed.image.as_deref(), Some("UE5H"));
        let tracks = db.get_tracks_from_feed(feed_id);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].iden, "two");
    }

    #[tokio::test]
    async fn subscribing_twice_is_rejected() {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let client = MockHttpClient::new().with_document(FEED_URL, &feed_xml(&[]));
        let library = Library::new(&client, &db, dir.path());

        library.subscribe(FEED_URL).await.unwrap();
        let again = library.subscribe(FEED_URL).await;

        assert!(matches!(again, Err(LibraryError::AlreadySubscribed(_))));
        assert_eq!(db.get_feeds().len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_adds_nothing() {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let client = MockHttpClient::new();
        let library = Library::new(&client, &db, dir.path());

        let result = library.subscribe(FEED_URL).await;

        assert!(matches!(result, Err(LibraryError::Feed(_))));
        assert!(db.get_feeds().is_empty());
    }

    #[tokio::test]
    async fn refresh_adds_only_newer_episodes() {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let first = MockHttpClient::new().with_document(
            FEED_URL,
            &feed_xml(&[("one", "Mon, 01 Jan 2024 10:00:00 +0000")]),
        );
        let feed_id = Library::new(&first, &db, dir.path())
            .subscribe(FEED_URL)
            .await
            .unwrap();

        let second = MockHttpClient::new().with_document(
            FEED_URL,
            &feed_xml(&[
                ("old", "Sun, 31 Dec 2023 10:00:00 +0000"),
                ("one", "Mon, 01 Jan 2024 10:00:00 +0000"),
                ("three", "Wed, 03 Jan 2024 10:00:00 +0000"),
            ]),
        );
        let added = Library::new(&second, &db, dir.path())
            .refresh(feed_id)
            .await
            .unwrap();

        assert_eq!(added, 1);
        let idens: Vec<String> = db
            .get_tracks_from_feed(feed_id)
            .into_iter()
            .map(|t| t.iden)
            .collect();
        assert_eq!(idens, vec!["three", "one"]);
    }

    #[tokio::test]
    async fn refresh_of_unknown_feed_fails() {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let client = MockHttpClient::new();
        let library = Library::new(&client, &db, dir.path());

        assert!(matches!(
            library.refresh(42).await,
            Err(LibraryError::UnknownFeed(42))
        ));
        assert_eq!(library.refresh_all().await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_deletes_downloaded_files() {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let client = MockHttpClient::new().with_document(
            FEED_URL,
            &feed_xml(&[("one", "Mon, 01 Jan 2024 10:00:00 +0000")]),
        );
        let library = Library::new(&client, &db, dir.path());
        let feed_id = library.subscribe(FEED_URL).await.unwrap();
        let track = db.get_tracks_from_feed(feed_id).remove(0);
        let path = dir.path().join("podcast_1.mp3");
        std::fs::write(&path, b"audio").unwrap();
        db.set_track_downloaded(track.id, "podcast_1.mp3");

        assert!(library.unsubscribe(feed_id));

        assert!(!path.exists());
        assert!(db.get_feeds().is_empty());
        assert!(db.get_track(track.id).is_none());
    }
}
