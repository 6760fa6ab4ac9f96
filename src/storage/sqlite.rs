// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::feed::FeedEntry;
use crate::model::{ALL_LIST_ID, Feed, List, Track};

use super::Storage;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS FEEDS (
    ID INTEGER PRIMARY KEY AUTOINCREMENT UNIQUE NOT NULL,
    URL TEXT UNIQUE NOT NULL,
    TITLE TEXT UNIQUE NOT NULL,
    IMAGE TEXT,
    NORDER INTEGER);
CREATE TABLE IF NOT EXISTS LISTS (
    ID INTEGER PRIMARY KEY AUTOINCREMENT UNIQUE NOT NULL,
    NAME TEXT UNIQUE NOT NULL,
    NORDER INTEGER);
CREATE TABLE IF NOT EXISTS TRACKS (
    ID INTEGER UNIQUE NOT NULL PRIMARY KEY AUTOINCREMENT,
    FEED_ID INTEGER REFERENCES FEEDS (ID) ON DELETE CASCADE NOT NULL,
    IDEN TEXT UNIQUE NOT NULL,
    DATE TEXT NOT NULL,
    TITLE TEXT NOT NULL,
    URL TEXT UNIQUE NOT NULL,
    LINK TEXT NOT NULL DEFAULT '',
    DESCRIPTION TEXT NOT NULL DEFAULT '',
    DURATION INTEGER NOT NULL DEFAULT 0,
    POSITION INTEGER NOT NULL DEFAULT 0,
    DOWNLOADED INTEGER NOT NULL DEFAULT 0,
    LISTENED INTEGER NOT NULL DEFAULT 0,
    FILENAME TEXT,
    NORDER INTEGER);
CREATE TABLE IF NOT EXISTS LIST (
    ID INTEGER PRIMARY KEY AUTOINCREMENT UNIQUE NOT NULL,
    LIST_ID INTEGER REFERENCES LISTS (ID) ON DELETE CASCADE,
    TRACK_ID INTEGER REFERENCES TRACKS (ID) ON DELETE CASCADE,
    POSITION INTEGER NOT NULL DEFAULT 0,
    LISTENED INTEGER NOT NULL DEFAULT 0,
    NORDER INTEGER,
    UNIQUE (LIST_ID, TRACK_ID) ON CONFLICT IGNORE);

CREATE VIEW IF NOT EXISTS TRACKS_FEED_VIEW AS
    SELECT
        TRACKS.ID, TRACKS.FEED_ID, TRACKS.IDEN, TRACKS.DATE, TRACKS.TITLE,
        TRACKS.URL, TRACKS.LINK, TRACKS.DESCRIPTION, TRACKS.DURATION,
        TRACKS.POSITION, TRACKS.DOWNLOADED, TRACKS.LISTENED, TRACKS.FILENAME,
        TRACKS.NORDER,
        FEEDS.TITLE AS PODCAST_NAME,
        FEEDS.IMAGE AS PODCAST_IMAGE
    FROM TRACKS
    LEFT JOIN FEEDS ON TRACKS.FEED_ID = FEEDS.ID;

CREATE VIEW IF NOT EXISTS TRACKS_LIST_VIEW AS
    SELECT
        TRACKS.ID, TRACKS.FEED_ID, TRACKS.IDEN, TRACKS.DATE, TRACKS.TITLE,
        TRACKS.URL, TRACKS.LINK, TRACKS.DESCRIPTION, TRACKS.DURATION,
        LIST.POSITION, TRACKS.DOWNLOADED, LIST.LISTENED, TRACKS.FILENAME,
        LIST.NORDER,
        FEEDS.TITLE AS PODCAST_NAME,
        FEEDS.IMAGE AS PODCAST_IMAGE,
        LIST.LIST_ID AS LIST_ID
    FROM LIST
    JOIN TRACKS ON LIST.TRACK_ID = TRACKS.ID
    LEFT JOIN FEEDS ON TRACKS.FEED_ID = FEEDS.ID;

INSERT OR IGNORE INTO LISTS (ID, NAME, NORDER) VALUES (1, 'All', 1);
"#;

const TRACK_COLUMNS: &str = "ID, FEED_ID, IDEN, DATE, TITLE, URL, LINK, DESCRIPTION, DURATION, \
     POSITION, DOWNLOADED, LISTENED, FILENAME, NORDER";

/// SQLite-backed [`Storage`]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (and migrate) the database file, creating its directory
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectoryFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn max_norder(&self, table: &str) -> Result<i64, StorageError> {
        let sql = format!("SELECT MAX(NORDER) FROM {table}");
        let max: Option<i64> = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(max.unwrap_or(0))
    }

    fn max_norder_in_list(&self, list_id: i64) -> Result<i64, StorageError> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(NORDER) FROM LIST WHERE LIST_ID = ?1",
            params![list_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    fn query_tracks(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
        with_feed: bool,
        with_list: bool,
    ) -> Result<Vec<Track>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| track_from_row(row, with_feed, with_list))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn try_insert_tracks(
        &self,
        feed_id: i64,
        entries: &[FeedEntry],
        newer_than: Option<&str>,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut norder = self.max_norder("TRACKS")?;
        let mut list_norder = self.max_norder_in_list(ALL_LIST_ID)?;
        let mut inserted = 0;

        for entry in entries {
            if newer_than.is_some_and(|limit| entry.date.as_str() <= limit) {
                continue;
            }

            norder += 1;
            let changed = tx.execute(
                "INSERT OR IGNORE INTO TRACKS \
                 (FEED_ID, IDEN, DATE, TITLE, URL, LINK, DESCRIPTION, NORDER) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    feed_id,
                    entry.iden,
                    entry.date,
                    entry.title,
                    entry.url,
                    entry.link,
                    entry.description,
                    norder
                ],
            )?;
            if changed == 0 {
                debug!("track {} already stored", entry.iden);
                continue;
            }

            let track_id = tx.last_insert_rowid();
            list_norder += 1;
            tx.execute(
                "INSERT INTO LIST (LIST_ID, TRACK_ID, POSITION, NORDER) VALUES (?1, ?2, 0, ?3)",
                params![ALL_LIST_ID, track_id, list_norder],
            )?;
            inserted += 1;
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn update(&self, op: &str, sql: &str, args: impl rusqlite::Params) -> usize {
        logged(op, self.conn.execute(sql, args).map_err(StorageError::from)).unwrap_or(0)
    }
}

fn logged<T>(op: &str, result: Result<T, StorageError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("storage: {op} failed: {e}");
            None
        }
    }
}

fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        image: row.get(3)?,
        norder: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
    })
}

fn track_from_row(row: &Row<'_>, with_feed: bool, with_list: bool) -> rusqlite::Result<Track> {
    let duration: i64 = row.get(8)?;
    let position: i64 = row.get(9)?;
    let filename: Option<String> = row.get(12)?;
    let downloaded: bool = row.get(10)?;

    let mut track = Track {
        id: row.get(0)?,
        feed_id: row.get(1)?,
        iden: row.get(2)?,
        date: row.get(3)?,
        title: row.get(4)?,
        url: row.get(5)?,
        link: row.get(6)?,
        description: row.get(7)?,
        duration: duration.max(0) as u64,
        position: position.max(0) as u64,
        downloaded: downloaded && filename.as_deref().is_some_and(|f| !f.is_empty()),
        listened: row.get(11)?,
        filename: filename.filter(|f| !f.is_empty() && downloaded),
        norder: row.get::<_, Option<i64>>(13)?.unwrap_or(0),
        ..Default::default()
    };

    if with_feed {
        track.feed_name = row.get(14)?;
        track.feed_image = row.get(15)?;
    }
    if with_list {
        track.list_id = row.get(16)?;
    }
    Ok(track)
}

impl Storage for Database {
    fn get_feeds(&self) -> Vec<Feed> {
        let result = (|| -> Result<Vec<Feed>, StorageError> {
            let mut stmt = self
                .conn
                .prepare("SELECT ID, URL, TITLE, IMAGE, NORDER FROM FEEDS ORDER BY NORDER")?;
            let rows = stmt.query_map([], feed_from_row)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })();
        logged("get_feeds", result).unwrap_or_default()
    }

    fn get_feed(&self, id: i64) -> Option<Feed> {
        let result = self
            .conn
            .query_row(
                "SELECT ID, URL, TITLE, IMAGE, NORDER FROM FEEDS WHERE ID = ?1",
                params![id],
                feed_from_row,
            )
            .optional()
            .map_err(StorageError::from);
        logged("get_feed", result).flatten()
    }

    fn get_feed_id(&self, url: &str) -> Option<i64> {
        let result = self
            .conn
            .query_row("SELECT ID FROM FEEDS WHERE URL = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StorageError::from);
        logged("get_feed_id", result).flatten()
    }

    fn insert_feed(&self, url: &str, title: &str, image: Option<&str>) -> Option<i64> {
        let result = (|| -> Result<i64, StorageError> {
            let norder = self.max_norder("FEEDS")? + 1;
            self.conn.execute(
                "INSERT INTO FEEDS (URL, TITLE, IMAGE, NORDER) VALUES (?1, ?2, ?3, ?4)",
                params![url, title, image, norder],
            )?;
            Ok(self.conn.last_insert_rowid())
        })();
        logged("insert_feed", result)
    }

    fn remove_feed(&self, id: i64) -> bool {
        self.update("remove_feed", "DELETE FROM FEEDS WHERE ID = ?1", params![id]) > 0
    }

    fn get_track(&self, id: i64) -> Option<Track> {
        let sql = "SELECT * FROM TRACKS_FEED_VIEW WHERE ID = ?1";
        let result = self.query_tracks(sql, params![id], true, false);
        logged("get_track", result).and_then(|tracks| tracks.into_iter().next())
    }

    fn get_tracks_from_feed(&self, feed_id: i64) -> Vec<Track> {
        let sql = "SELECT * FROM TRACKS_FEED_VIEW WHERE FEED_ID = ?1 ORDER BY DATE DESC, NORDER";
        logged(
            "get_tracks_from_feed",
            self.query_tracks(sql, params![feed_id], true, false),
        )
        .unwrap_or_default()
    }

    fn get_last_track_from_feed(&self, feed_id: i64) -> Option<Track> {
        let sql = format!(
            "SELECT {TRACK_COLUMNS} FROM TRACKS WHERE FEED_ID = ?1 ORDER BY DATE DESC LIMIT 1"
        );
        let result = self.query_tracks(&sql, params![feed_id], false, false);
        logged("get_last_track_from_feed", result).and_then(|tracks| tracks.into_iter().next())
    }

    fn insert_tracks(
        &self,
        feed_id: i64,
        entries: &[FeedEntry],
        newer_than: Option<&str>,
    ) -> usize {
        logged(
            "insert_tracks",
            self.try_insert_tracks(feed_id, entries, newer_than),
        )
        .unwrap_or(0)
    }

    fn set_track_position(&self, id: i64, seconds: u64) {
        self.update(
            "set_track_position",
            "UPDATE TRACKS SET POSITION = ?1 WHERE ID = ?2",
            params![seconds as i64, id],
        );
    }

    fn set_track_duration(&self, id: i64, seconds: u64) {
        self.update(
            "set_track_duration",
            "UPDATE TRACKS SET DURATION = ?1 WHERE ID = ?2",
            params![seconds as i64, id],
        );
    }

    fn set_track_listened(&self, id: i64) {
        self.update(
            "set_track_listened",
            "UPDATE TRACKS SET LISTENED = 1 WHERE ID = ?1",
            params![id],
        );
    }

    fn set_track_no_listened(&self, id: i64) {
        self.update(
            "set_track_no_listened",
            "UPDATE TRACKS SET LISTENED = 0 WHERE ID = ?1",
            params![id],
        );
    }

    fn set_track_downloaded(&self, id: i64, filename: &str) {
        self.update(
            "set_track_downloaded",
            "UPDATE TRACKS SET FILENAME = ?1, DOWNLOADED = 1 WHERE ID = ?2",
            params![filename, id],
        );
    }

    fn set_track_no_downloaded(&self, id: i64) {
        self.update(
            "set_track_no_downloaded",
            "UPDATE TRACKS SET FILENAME = NULL, DOWNLOADED = 0 WHERE ID = ?1",
            params![id],
        );
    }

    fn get_lists(&self) -> Vec<List> {
        let result = (|| -> Result<Vec<List>, StorageError> {
            let mut stmt = self
                .conn
                .prepare("SELECT ID, NAME, NORDER FROM LISTS ORDER BY NORDER")?;
            let rows = stmt.query_map([], |row| {
                Ok(List {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    norder: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })();
        logged("get_lists", result).unwrap_or_default()
    }

    fn add_list(&self, name: &str) -> Option<i64> {
        let result = (|| -> Result<i64, StorageError> {
            let norder = self.max_norder("LISTS")? + 1;
            self.conn.execute(
                "INSERT INTO LISTS (NAME, NORDER) VALUES (?1, ?2)",
                params![name, norder],
            )?;
            Ok(self.conn.last_insert_rowid())
        })();
        logged("add_list", result)
    }

    fn add_track_to_list(&self, list_id: i64, track_id: i64) -> Option<i64> {
        let result = (|| -> Result<Option<i64>, StorageError> {
            let norder = self.max_norder_in_list(list_id)? + 1;
            let changed = self.conn.execute(
                "INSERT INTO LIST (LIST_ID, TRACK_ID, POSITION, NORDER) VALUES (?1, ?2, 0, ?3)",
                params![list_id, track_id, norder],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Ok(Some(self.conn.last_insert_rowid()))
        })();
        logged("add_track_to_list", result).flatten()
    }

    fn get_tracks_from_list(&self, list_id: i64) -> Vec<Track> {
        let sql = "SELECT * FROM TRACKS_LIST_VIEW WHERE LIST_ID = ?1 ORDER BY NORDER";
        logged(
            "get_tracks_from_list",
            self.query_tracks(sql, params![list_id], true, true),
        )
        .unwrap_or_default()
    }

    fn set_track_position_in_list(&self, list_id: i64, track_id: i64, seconds: u64) {
        self.update(
            "set_track_position_in_list",
            "UPDATE LIST SET POSITION = ?1 WHERE LIST_ID = ?2 AND TRACK_ID = ?3",
            params![seconds as i64, list_id, track_id],
        );
    }

    fn set_track_listened_in_list(&self, list_id: i64, track_id: i64) {
        self.update(
            "set_track_listened_in_list",
            "UPDATE LIST SET LISTENED = 1 WHERE LIST_ID = ?1 AND TRACK_ID = ?2",
            params![list_id, track_id],
        );
    }

    fn set_track_no_listened_in_list(&self, list_id: i64, track_id: i64) {
        self.update(
            "set_track_no_listened_in_list",
            "UPDATE LIST SET LISTENED = 0 WHERE LIST_ID = ?1 AND TRACK_ID = ?2",
            params![list_id, track_id],
        );
    }

    fn remove_listened_from_list(&self, list_id: i64) -> usize {
        self.update(
            "remove_listened_from_list",
            "DELETE FROM LIST WHERE LIST_ID = ?1 AND LISTENED = 1",
            params![list_id],
        )
    }

    fn sort_list(&self, list_id: i64, order: &[(i64, i64)]) {
        let result = (|| -> Result<(), StorageError> {
            let tx = self.conn.unchecked_transaction()?;
            for (track_id, norder) in order {
                tx.execute(
                    "UPDATE LIST SET NORDER = ?1 WHERE LIST_ID = ?2 AND TRACK_ID = ?3",
                    params![norder, list_id, track_id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })();
        logged("sort_list", result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(iden: &str, date: &str) -> FeedEntry {
        FeedEntry {
            iden: iden.to_string(),
            date: date.to_string(),
            title: format!("Episode {iden}"),
            url: format!("https://example.com/{iden}.mp3"),
            link: String::new(),
            description: String::new(),
        }
    }

    fn db_with_feed() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let feed_id = db
            .insert_feed("https://example.com/feed.xml", "Example", Some("aW1n"))
            .unwrap();
        (db, feed_id)
    }

    #[test]
    fn open_creates_file_and_all_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("feeds.db");

        let db = Database::open(&path).unwrap();

        assert!(path.exists());
        let lists = db.get_lists();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, ALL_LIST_ID);
        assert_eq!(lists[0].name, "All");
    }

    #[test]
    fn duplicate_feed_url_is_a_silent_no_op() {
        let (db, feed_id) = db_with_feed();

        assert_eq!(
            db.insert_feed("https://example.com/feed.xml", "Other title", None),
            None
        );
        assert_eq!(db.get_feeds().len(), 1);
        assert_eq!(db.get_feed_id("https://example.com/feed.xml"), Some(feed_id));
        assert_eq!(db.get_feed(feed_id).unwrap().image.as_deref(), Some("aW1n"));
    }

    #[test]
    fn insert_tracks_dedups_and_fills_all_list() {
        let (db, feed_id) = db_with_feed();
        let entries = vec![entry("a", "20240101T000000"), entry("b", "20240201T000000")];

        assert_eq!(db.insert_tracks(feed_id, &entries, None), 2);
        assert_eq!(db.insert_tracks(feed_id, &entries, None), 0);

        let tracks = db.get_tracks_from_feed(feed_id);
        assert_eq!(tracks.len(), 2);
        // newest first
        assert_eq!(tracks[0].iden, "b");
        assert_eq!(tracks[0].feed_name.as_deref(), Some("Example"));
        assert_eq!(db.get_tracks_from_list(ALL_LIST_ID).len(), 2);
    }

    #[test]
    fn insert_tracks_honours_newer_than() {
        let (db, feed_id) = db_with_feed();
        let entries = vec![
            entry("old", "20230101T000000"),
            entry("same", "20240101T000000"),
            entry("new", "20240301T000000"),
        ];

        let inserted = db.insert_tracks(feed_id, &entries, Some("20240101T000000"));

        assert_eq!(inserted, 1);
        assert_eq!(db.get_last_track_from_feed(feed_id).unwrap().iden, "new");
    }

    #[test]
    fn track_state_updates_are_persisted() {
        let (db, feed_id) = db_with_feed();
        db.insert_tracks(feed_id, &[entry("a", "20240101T000000")], None);
        let id = db.get_tracks_from_feed(feed_id)[0].id;

        db.set_track_downloaded(id, "podcast_1.mp3");
        db.set_track_duration(id, 300);
        db.set_track_position(id, 42);
        db.set_track_listened(id);

        let track = db.get_track(id).unwrap();
        assert!(track.downloaded);
        assert_eq!(track.filename.as_deref(), Some("podcast_1.mp3"));
        assert_eq!(track.duration, 300);
        assert_eq!(track.position, 42);
        assert!(track.listened);

        db.set_track_no_downloaded(id);
        db.set_track_no_listened(id);
        let track = db.get_track(id).unwrap();
        assert!(!track.downloaded);
        assert!(track.filename.is_none());
        assert!(!track.listened);
    }

    #[test]
    fn remove_feed_cascades_to_tracks_and_lists() {
        let (db, feed_id) = db_with_feed();
        db.insert_tracks(feed_id, &[entry("a", "20240101T000000")], None);

        assert!(db.remove_feed(feed_id));

        assert!(db.get_feed(feed_id).is_none());
        assert!(db.get_tracks_from_feed(feed_id).is_empty());
        assert!(db.get_tracks_from_list(ALL_LIST_ID).is_empty());
        assert!(!db.remove_feed(feed_id));
    }

    #[test]
    fn list_membership_is_idempotent_and_keeps_own_state() {
        let (db, feed_id) = db_with_feed();
        db.insert_tracks(feed_id, &[entry("a", "20240101T000000")], None);
        let track_id = db.get_tracks_from_feed(feed_id)[0].id;
        let list_id = db.add_list("Recent").unwrap();

        assert!(db.add_track_to_list(list_id, track_id).is_some());
        assert!(db.add_track_to_list(list_id, track_id).is_none());

        db.set_track_position_in_list(list_id, track_id, 99);
        db.set_track_listened_in_list(list_id, track_id);

        let in_list = &db.get_tracks_from_list(list_id)[0];
        assert_eq!(in_list.position, 99);
        assert!(in_list.listened);
        assert_eq!(in_list.list_id, Some(list_id));

        let global = db.get_track(track_id).unwrap();
        assert_eq!(global.position, 0);
        assert!(!global.listened);

        assert_eq!(db.remove_listened_from_list(list_id), 1);
        assert!(db.get_tracks_from_list(list_id).is_empty());
    }

    #[test]
    fn unmarked_list_entries_survive_pruning() {
        let (db, feed_id) = db_with_feed();
        db.insert_tracks(feed_id, &[entry("a", "20240101T000000")], None);
        let track_id = db.get_tracks_from_feed(feed_id)[0].id;

        db.set_track_listened_in_list(ALL_LIST_ID, track_id);
        db.set_track_no_listened_in_list(ALL_LIST_ID, track_id);

        assert!(!db.get_tracks_from_list(ALL_LIST_ID)[0].listened);
        assert_eq!(db.remove_listened_from_list(ALL_LIST_ID), 0);
        assert_eq!(db.get_tracks_from_list(ALL_LIST_ID).len(), 1);
    }

    #[test]
    fn sort_list_reorders_members() {
        let (db, feed_id) = db_with_feed();
        db.insert_tracks(
            feed_id,
            &[entry("a", "20240101T000000"), entry("b", "20240201T000000")],
            None,
        );
        let before: Vec<i64> = db
            .get_tracks_from_list(ALL_LIST_ID)
            .iter()
            .map(|t| t.id)
            .collect();

        db.sort_list(ALL_LIST_ID, &[(before[0], 20), (before[1], 10)]);

        let after: Vec<i64> = db
            .get_tracks_from_list(ALL_LIST_ID)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(after, vec![before[1], before[0]]);
    }
}
