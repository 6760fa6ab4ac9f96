// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistence gateway for feeds, tracks and lists.
//!
//! Every call is synchronous and completes before the caller continues.
//! Integrity violations and SQL failures are logged inside the gateway and
//! surface as `None`, `false`, `0` or an empty vector: callers treat those as
//! "nothing happened".

mod sqlite;

pub use sqlite::Database;

use crate::feed::FeedEntry;
use crate::model::{Feed, List, Track};

pub trait Storage {
    fn get_feeds(&self) -> Vec<Feed>;
    fn get_feed(&self, id: i64) -> Option<Feed>;
    fn get_feed_id(&self, url: &str) -> Option<i64>;
    /// Insert a feed, returning its id; `None` on duplicate URL or title
    fn insert_feed(&self, url: &str, title: &str, image: Option<&str>) -> Option<i64>;
    /// Remove a feed and, by cascade, its tracks and list entries
    fn remove_feed(&self, id: i64) -> bool;

    fn get_track(&self, id: i64) -> Option<Track>;
    /// Tracks of a feed, newest first
    fn get_tracks_from_feed(&self, feed_id: i64) -> Vec<Track>;
    fn get_last_track_from_feed(&self, feed_id: i64) -> Option<Track>;
    /// Insert entries dated strictly after `newer_than` (all when `None`);
    /// duplicates are skipped. New tracks are appended to the `All` list.
    /// Returns the number of inserted tracks.
    fn insert_tracks(&self, feed_id: i64, entries: &[FeedEntry], newer_than: Option<&str>)
    -> usize;

    fn set_track_position(&self, id: i64, seconds: u64);
    fn set_track_duration(&self, id: i64, seconds: u64);
    fn set_track_listened(&self, id: i64);
    fn set_track_no_listened(&self, id: i64);
    fn set_track_downloaded(&self, id: i64, filename: &str);
    fn set_track_no_downloaded(&self, id: i64);

    fn get_lists(&self) -> Vec<List>;
    fn add_list(&self, name: &str) -> Option<i64>;
    /// Add a track to a list; re-adding an existing member is a no-op
    fn add_track_to_list(&self, list_id: i64, track_id: i64) -> Option<i64>;
    /// Tracks of a list in list order, with list-scoped position/listened
    fn get_tracks_from_list(&self, list_id: i64) -> Vec<Track>;
    fn set_track_position_in_list(&self, list_id: i64, track_id: i64, seconds: u64);
    fn set_track_listened_in_list(&self, list_id: i64, track_id: i64);
    fn set_track_no_listened_in_list(&self, list_id: i64, track_id: i64);
    /// Drop entries already marked listened from a list
    fn remove_listened_from_list(&self, list_id: i64) -> usize;
    /// Reassign list order: `(track_id, norder)` pairs
    fn sort_list(&self, list_id: i64, order: &[(i64, i64)]);
}
