// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::Ordering;

/// Id of the list every refreshed episode is appended to
pub const ALL_LIST_ID: i64 = 1;

/// A subscribed podcast
#[derive(Debug, Clone)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub title: String,
    /// Base64-encoded cover image
    pub image: Option<String>,
    pub norder: i64,
}

/// A named, ordered grouping of episodes
#[derive(Debug, Clone)]
pub struct List {
    pub id: i64,
    pub name: String,
    pub norder: i64,
}

/// One episode of a feed, with its download and playback state
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub id: i64,
    pub feed_id: i64,
    /// Unique identifier taken from the feed entry
    pub iden: String,
    /// Publish date formatted as `%Y%m%dT%H%M%S`, sorts lexically
    pub date: String,
    pub title: String,
    pub url: String,
    pub link: String,
    pub description: String,
    /// Seconds; 0 means unknown
    pub duration: u64,
    /// Seconds
    pub position: u64,
    pub downloaded: bool,
    pub listened: bool,
    /// Local file name inside the podcasts directory, set iff downloaded
    pub filename: Option<String>,
    pub norder: i64,
    pub feed_name: Option<String>,
    pub feed_image: Option<String>,
    /// Set when the track was loaded through a list
    pub list_id: Option<i64>,
}

impl Track {
    /// Position as a 0..=100 percentage of the known duration
    pub fn relative_position(&self) -> u8 {
        if self.duration == 0 {
            return 0;
        }
        ((self.position.min(self.duration) * 100) / self.duration) as u8
    }

    pub fn mark_downloaded(&mut self, filename: String) {
        self.filename = Some(filename);
        self.downloaded = true;
    }

    pub fn mark_not_downloaded(&mut self) {
        self.filename = None;
        self.downloaded = false;
    }
}

impl PartialEq for Feed {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Feed {}

impl PartialOrd for Feed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.norder.cmp(&other.norder))
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl PartialOrd for Track {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.norder.cmp(&other.norder))
    }
}
