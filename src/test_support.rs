// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hand-written doubles shared by the unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::coordinator::{EpisodeRow, EpisodeView};
use crate::download::{DownloadEvent, DownloadObserver, TransferLauncher, TransferRequest};
use crate::error::PlaybackError;
use crate::feed::FeedEntry;
use crate::http::{ByteStream, HttpClient, HttpDocument, HttpResponse};
use crate::model::{Feed, List, Track};
use crate::playback::{
    AudioBackend, AudioEngine, EQ_BANDS, EngineNotifier, EngineSignal, PlayerEvent,
    PlayerObserver, PlayerStatus,
};
use crate::storage::{Database, Storage};

pub fn sample_entry(name: &str) -> FeedEntry {
    FeedEntry {
        iden: name.to_string(),
        date: "20240101T000000".to_string(),
        title: format!("Episode {name}"),
        url: format!("https://example.com/{name}.mp3"),
        link: String::new(),
        description: String::new(),
    }
}

/// Serves canned documents; unknown URLs answer 404
#[derive(Default)]
pub struct MockHttpClient {
    documents: HashMap<String, Bytes>,
    delay: Option<Duration>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: &str, body: impl AsRef<[u8]>) -> Self {
        self.documents
            .insert(url.to_string(), Bytes::copy_from_slice(body.as_ref()));
        self
    }

    /// Delay every response
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn lookup(&self, url: &str) -> (u16, Bytes) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.documents.get(url) {
            Some(body) => (200, body.clone()),
            None => (404, Bytes::new()),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get_bytes(&self, url: &str) -> Result<HttpDocument, reqwest::Error> {
        let (status, body) = self.lookup(url).await;
        Ok(HttpDocument { status, body })
    }

    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let (status, body) = self.lookup(url).await;
        let content_length = Some(body.len() as u64);
        let stream: ByteStream = Box::pin(futures::stream::iter(vec![Ok(body)]));
        Ok(HttpResponse {
            status,
            content_length,
            body: stream,
        })
    }
}

/// Records launched track ids without transferring anything
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    launched: Arc<Mutex<Vec<i64>>>,
}

impl RecordingLauncher {
    pub fn launched(&self) -> Vec<i64> {
        self.launched.lock().unwrap().clone()
    }
}

impl TransferLauncher for RecordingLauncher {
    fn launch(&self, request: &TransferRequest) {
        self.launched.lock().unwrap().push(request.track_id);
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<DownloadEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<DownloadEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn terminal_count(&self) -> usize {
        self.events().iter().filter(|e| e.is_terminal()).count()
    }

    pub fn terminal_events_for(&self, track_id: i64) -> usize {
        self.events()
            .iter()
            .filter(|e| e.is_terminal() && e.track_id() == track_id)
            .count()
    }
}

impl DownloadObserver for RecordingObserver {
    fn report(&self, event: &DownloadEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[derive(Default)]
pub struct RecordingPlayerObserver {
    events: Mutex<Vec<PlayerEvent>>,
}

impl RecordingPlayerObserver {
    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PlayerObserver for RecordingPlayerObserver {
    fn report(&self, event: &PlayerEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// State shared by a [`FakeBackend`] and every engine it opened
#[derive(Debug, Default)]
pub struct EngineState {
    pub opened: Vec<PathBuf>,
    pub commands: Vec<&'static str>,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub rate: f64,
    pub volume: f64,
    pub equalizer: [f64; EQ_BANDS],
    pub notifier: Option<EngineNotifier>,
}

/// Audio backend whose engines only record what they were asked to do
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<EngineState>>,
}

impl FakeBackend {
    pub fn with_duration(seconds: u64) -> Self {
        let backend = Self::default();
        backend.set_duration(Some(seconds));
        backend
    }

    pub fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap()
    }

    pub fn set_position(&self, seconds: u64) {
        self.state().position = Duration::from_secs(seconds);
    }

    pub fn set_duration(&self, seconds: Option<u64>) {
        self.state().duration = seconds.map(Duration::from_secs);
    }

    pub fn commands(&self) -> Vec<&'static str> {
        self.state().commands.clone()
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.state().opened.clone()
    }

    /// Raise a signal from the most recently opened engine
    pub fn emit(&self, signal: EngineSignal) -> bool {
        let notifier = self.state().notifier.clone();
        notifier.is_some_and(|n| n.notify(signal))
    }
}

impl AudioBackend for FakeBackend {
    fn open(
        &self,
        path: &Path,
        notifier: EngineNotifier,
    ) -> Result<Box<dyn AudioEngine>, PlaybackError> {
        let mut state = self.state();
        state.opened.push(path.to_path_buf());
        state.commands.push("open");
        state.position = Duration::ZERO;
        state.notifier = Some(notifier);
        Ok(Box::new(FakeEngine {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap()
    }
}

impl AudioEngine for FakeEngine {
    fn play(&mut self) {
        self.state().commands.push("play");
    }

    fn pause(&mut self) {
        self.state().commands.push("pause");
    }

    fn stop(&mut self) {
        let mut state = self.state();
        state.commands.push("stop");
        state.position = Duration::ZERO;
    }

    fn seek(&mut self, position: Duration) {
        let mut state = self.state();
        state.commands.push("seek");
        state.position = position;
    }

    fn set_rate(&mut self, rate: f64) {
        self.state().rate = rate;
    }

    fn set_volume(&mut self, volume: f64) {
        self.state().volume = volume;
    }

    fn set_equalizer(&mut self, bands: &[f64; EQ_BANDS]) {
        self.state().equalizer = *bands;
    }

    fn duration(&self) -> Option<Duration> {
        self.state().duration
    }

    fn position(&self) -> Duration {
        self.state().position
    }
}

/// SQLite storage that also records every write with the track id it touched
pub struct RecordingStorage {
    inner: Database,
    calls: RefCell<Vec<(&'static str, i64)>>,
}

impl RecordingStorage {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(&'static str, i64)> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, op: &str, id: i64) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(name, call_id)| *name == op && *call_id == id)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, op: &'static str, id: i64) {
        self.calls.borrow_mut().push((op, id));
    }
}

impl Storage for RecordingStorage {
    fn get_feeds(&self) -> Vec<Feed> {
        self.inner.get_feeds()
    }

    fn get_feed(&self, id: i64) -> Option<Feed> {
        self.inner.get_feed(id)
    }

    fn get_feed_id(&self, url: &str) -> Option<i64> {
        self.inner.get_feed_id(url)
    }

    fn insert_feed(&self, url: &str, title: &str, image: Option<&str>) -> Option<i64> {
        self.inner.insert_feed(url, title, image)
    }

    fn remove_feed(&self, id: i64) -> bool {
        self.record("remove_feed", id);
        self.inner.remove_feed(id)
    }

    fn get_track(&self, id: i64) -> Option<Track> {
        self.inner.get_track(id)
    }

    fn get_tracks_from_feed(&self, feed_id: i64) -> Vec<Track> {
        self.inner.get_tracks_from_feed(feed_id)
    }

    fn get_last_track_from_feed(&self, feed_id: i64) -> Option<Track> {
        self.inner.get_last_track_from_feed(feed_id)
    }

    fn insert_tracks(
        &self,
        feed_id: i64,
        entries: &[FeedEntry],
        newer_than: Option<&str>,
    ) -> usize {
        self.record("insert_tracks", feed_id);
        self.inner.insert_tracks(feed_id, entries, newer_than)
    }

    fn set_track_position(&self, id: i64, seconds: u64) {
        self.record("set_track_position", id);
        self.inner.set_track_position(id, seconds);
    }

    fn set_track_duration(&self, id: i64, seconds: u64) {
        self.record("set_track_duration", id);
        self.inner.set_track_duration(id, seconds);
    }

    fn set_track_listened(&self, id: i64) {
        self.record("set_track_listened", id);
        self.inner.set_track_listened(id);
    }

    fn set_track_no_listened(&self, id: i64) {
        self.record("set_track_no_listened", id);
        self.inner.set_track_no_listened(id);
    }

    fn set_track_downloaded(&self, id: i64, filename: &str) {
        self.record("set_track_downloaded", id);
        self.inner.set_track_downloaded(id, filename);
    }

    fn set_track_no_downloaded(&self, id: i64) {
        self.record("set_track_no_downloaded", id);
        self.inner.set_track_no_downloaded(id);
    }

    fn get_lists(&self) -> Vec<List> {
        self.inner.get_lists()
    }

    fn add_list(&self, name: &str) -> Option<i64> {
        self.inner.add_list(name)
    }

    fn add_track_to_list(&self, list_id: i64, track_id: i64) -> Option<i64> {
        self.record("add_track_to_list", track_id);
        self.inner.add_track_to_list(list_id, track_id)
    }

    fn get_tracks_from_list(&self, list_id: i64) -> Vec<Track> {
        self.inner.get_tracks_from_list(list_id)
    }

    fn set_track_position_in_list(&self, list_id: i64, track_id: i64, seconds: u64) {
        self.record("set_track_position_in_list", track_id);
        self.inner
            .set_track_position_in_list(list_id, track_id, seconds);
    }

    fn set_track_listened_in_list(&self, list_id: i64, track_id: i64) {
        self.record("set_track_listened_in_list", track_id);
        self.inner.set_track_listened_in_list(list_id, track_id);
    }

    fn set_track_no_listened_in_list(&self, list_id: i64, track_id: i64) {
        self.record("set_track_no_listened_in_list", track_id);
        self.inner.set_track_no_listened_in_list(list_id, track_id);
    }

    fn remove_listened_from_list(&self, list_id: i64) -> usize {
        self.record("remove_listened_from_list", list_id);
        self.inner.remove_listened_from_list(list_id)
    }

    fn sort_list(&self, list_id: i64, order: &[(i64, i64)]) {
        self.record("sort_list", list_id);
        self.inner.sort_list(list_id, order);
    }
}

#[derive(Debug, Default)]
struct ViewLog {
    replaced: usize,
    updated: Vec<usize>,
    transport: Vec<(PlayerStatus, u8)>,
    now_playing: Vec<i64>,
}

/// View that keeps a log of every callback; clones share the log
#[derive(Clone, Default)]
pub struct RecordingView {
    log: Rc<RefCell<ViewLog>>,
}

impl RecordingView {
    pub fn replaced(&self) -> usize {
        self.log.borrow().replaced
    }

    pub fn updated(&self) -> Vec<usize> {
        self.log.borrow().updated.clone()
    }

    pub fn transport(&self) -> Vec<(PlayerStatus, u8)> {
        self.log.borrow().transport.clone()
    }

    pub fn now_playing(&self) -> Vec<i64> {
        self.log.borrow().now_playing.clone()
    }
}

impl EpisodeView for RecordingView {
    fn rows_replaced(&mut self, _rows: &[EpisodeRow]) {
        self.log.borrow_mut().replaced += 1;
    }

    fn row_updated(&mut self, index: usize, _row: &EpisodeRow) {
        self.log.borrow_mut().updated.push(index);
    }

    fn transport_updated(&mut self, status: PlayerStatus, relative_position: u8) {
        self.log
            .borrow_mut()
            .transport
            .push((status, relative_position));
    }

    fn now_playing(&mut self, track: &Track) {
        self.log.borrow_mut().now_playing.push(track.id);
    }
}
