// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Episode list coordinator.
//!
//! Turns actions on the displayed episode rows into download requests and
//! transport calls, and keeps rows, storage and view consistent with the
//! callbacks coming back from the download queue and the player.

mod navigation;
mod row;

use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::download::{
    DownloadQueue, RequestOutcome, TransferRequest, local_filename, local_path, partial_path,
    remove_local_file,
};
use crate::error::PlaybackError;
use crate::mailbox::{MediaKey, TransferSignal};
use crate::model::Track;
use crate::playback::{EQ_BANDS, EngineSignal, Player, PlayerEvent, PlayerStatus};
use crate::probe;
use crate::storage::Storage;

pub use navigation::{next_playable, previous_playable};
pub use row::{EpisodeRow, EpisodeView, NullView};

pub struct EpisodeList {
    storage: Rc<dyn Storage>,
    player: Player,
    downloads: DownloadQueue,
    view: Box<dyn EpisodeView>,
    podcasts_dir: PathBuf,
    listened_threshold: f64,
    auto_advance: bool,
    rows: Vec<EpisodeRow>,
    active: Option<usize>,
}

impl EpisodeList {
    pub fn new(
        config: &Config,
        storage: Rc<dyn Storage>,
        mut player: Player,
        downloads: DownloadQueue,
        view: Box<dyn EpisodeView>,
    ) -> Self {
        player.set_speed(config.speed);
        player.set_volume(config.volume);
        Self {
            storage,
            player,
            downloads,
            view,
            podcasts_dir: config.podcasts_dir.clone(),
            listened_threshold: config.listened_threshold,
            auto_advance: config.auto_advance,
            rows: Vec::new(),
            active: None,
        }
    }

    pub fn rows(&self) -> &[EpisodeRow] {
        &self.rows
    }

    /// Index of the row loaded into the player
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn downloads(&self) -> &DownloadQueue {
        &self.downloads
    }

    pub fn downloads_mut(&mut self) -> &mut DownloadQueue {
        &mut self.downloads
    }

    pub fn show_feed(&mut self, feed_id: i64) {
        let tracks = self.storage.get_tracks_from_feed(feed_id);
        self.replace_rows(tracks);
    }

    pub fn show_list(&mut self, list_id: i64) {
        let tracks = self.storage.get_tracks_from_list(list_id);
        self.replace_rows(tracks);
    }

    /// Play/pause toggle on a row
    ///
    /// A playing row pauses; any other row starts playing, or is downloaded
    /// first when it has no local file yet.
    pub fn activate_play(&mut self, index: usize) -> bool {
        if self.active == Some(index) && self.player.status() == PlayerStatus::Playing {
            return self.pause_active();
        }
        self.play_row(index)
    }

    /// Make `index` the playing row
    pub fn play_row(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        if !row.can_play() {
            if row.downloading {
                debug!("row {index} is still downloading");
                return false;
            }
            return self.activate_download(index);
        }

        if self.active == Some(index) && self.player.has_source() {
            match self.player.status() {
                PlayerStatus::Playing => return true,
                PlayerStatus::Paused => {
                    self.player.play();
                    self.set_playing(index, true);
                    return true;
                }
                PlayerStatus::Stopped => {}
            }
        } else {
            self.pause_active();
        }
        self.load_and_play(index)
    }

    /// Download a row, or delete its local file when it is already downloaded
    pub fn activate_download(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        if row.downloading {
            return false;
        }
        if row.track.downloaded {
            self.remove_download(index);
            return true;
        }
        let track_id = row.track.id;
        self.download_track(track_id)
    }

    /// Queue a download for a track whether or not it is displayed
    pub fn download_track(&mut self, track_id: i64) -> bool {
        let Some(track) = self.find_track(track_id) else {
            warn!("cannot download unknown track {track_id}");
            return false;
        };
        if track.downloaded {
            debug!("track {track_id} is already downloaded");
            return false;
        }

        let request = TransferRequest::for_track(&track, &self.podcasts_dir);
        if self.downloads.request(request) == RequestOutcome::Duplicate {
            return false;
        }
        self.set_downloading(track_id, true);
        true
    }

    pub fn toggle_listened(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        let id = row.track.id;
        row.track.listened = !row.track.listened;
        if row.track.listened {
            self.storage.set_track_listened(id);
            if let Some(list_id) = row.track.list_id {
                self.storage.set_track_listened_in_list(list_id, id);
            }
        } else {
            self.storage.set_track_no_listened(id);
            if let Some(list_id) = row.track.list_id {
                self.storage.set_track_no_listened_in_list(list_id, id);
            }
        }
        self.refresh_row(index);
        true
    }

    /// Play the next playable row, wrapping around
    pub fn next(&mut self) -> Option<usize> {
        let target = next_playable(&self.playable_indices(), self.active)?;
        self.play_row(target);
        Some(target)
    }

    pub fn previous(&mut self) -> Option<usize> {
        let target = previous_playable(&self.playable_indices(), self.active)?;
        self.play_row(target);
        Some(target)
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.player.set_speed(speed);
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.player.set_volume(volume);
    }

    pub fn set_equalizer(&mut self, bands: [f64; EQ_BANDS]) {
        self.player.set_equalizer(bands);
    }

    pub fn seek_relative(&mut self, percent: u8) -> bool {
        let Some(index) = self.active else {
            return false;
        };
        if !self.player.set_relative_position(percent) {
            return false;
        }
        self.persist_position(index);
        self.update_transport();
        true
    }

    /// Periodic position sample, driven by the app loop timer
    pub fn sample_position(&mut self) {
        let Some(index) = self.active else {
            return;
        };
        if self.player.status() != PlayerStatus::Playing {
            return;
        }

        let engine_duration = self.player.get_duration();
        if let Some(row) = self.rows.get_mut(index)
            && row.track.duration == 0
            && engine_duration > 0
        {
            row.track.duration = engine_duration;
            self.storage.set_track_duration(row.track.id, engine_duration);
        }
        self.persist_position(index);

        let reached_end = self.rows.get(index).is_some_and(|row| {
            !row.track.listened
                && row.track.duration > 0
                && row.track.position as f64 / row.track.duration as f64
                    >= self.listened_threshold
        });
        if reached_end {
            self.mark_listened(index);
        }

        self.refresh_row(index);
        self.update_transport();
    }

    /// Apply a transfer completion callback posted through the mailbox
    pub fn handle_transfer(&mut self, signal: TransferSignal) {
        let track_id = signal.track_id();
        if self.downloads.current() != Some(track_id) {
            warn!("unexpected transfer signal for track {track_id}: {signal:?}");
            return;
        }

        match signal {
            TransferSignal::Started { .. } => {
                self.downloads.on_transfer_started(track_id);
                self.set_downloading(track_id, true);
            }
            TransferSignal::Ended { .. } => {
                self.finish_download(track_id);
                self.downloads.on_transfer_ended(track_id);
            }
            TransferSignal::Failed { reason, .. } => {
                self.discard_download(track_id);
                self.downloads.on_transfer_failed(track_id, &reason);
                let retrying = self.downloads.is_queued(track_id);
                self.set_downloading(track_id, retrying);
            }
        }
    }

    /// Apply an engine signal posted through the mailbox
    pub fn handle_engine(&mut self, session: u64, signal: EngineSignal) {
        let Some(event) = self.player.handle_signal(session, signal) else {
            return;
        };
        let Some(index) = self.active else {
            return;
        };

        match event {
            PlayerEvent::Ended(_) => self.on_playback_ended(index),
            PlayerEvent::Failed(message) => {
                warn!("playback of row {index} failed: {message}");
                self.set_playing(index, false);
            }
            PlayerEvent::DurationChanged(seconds) => {
                if let Some(row) = self.rows.get_mut(index)
                    && row.track.duration == 0
                    && seconds > 0
                {
                    row.track.duration = seconds;
                    self.storage.set_track_duration(row.track.id, seconds);
                    self.refresh_row(index);
                }
            }
            _ => {}
        }
    }

    pub fn media_play(&mut self) -> bool {
        match self
            .active
            .or_else(|| self.playable_indices().first().copied())
        {
            Some(index) => self.play_row(index),
            None => false,
        }
    }

    pub fn media_pause(&mut self) -> bool {
        self.pause_active()
    }

    pub fn media_stop(&mut self) -> bool {
        let Some(index) = self.active else {
            return false;
        };
        if self.player.status() == PlayerStatus::Playing {
            self.persist_position(index);
        }
        let stopped = self.player.stop();
        self.set_playing(index, false);
        stopped
    }

    pub fn media_next(&mut self) -> bool {
        self.next().is_some()
    }

    pub fn media_previous(&mut self) -> bool {
        self.previous().is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.player.status() == PlayerStatus::Playing
    }

    /// `PlayPause` toggles on the current transport status
    pub fn media_key(&mut self, key: MediaKey) -> bool {
        match key {
            MediaKey::Play => self.media_play(),
            MediaKey::Pause => self.media_pause(),
            MediaKey::PlayPause if self.is_playing() => self.media_pause(),
            MediaKey::PlayPause => self.media_play(),
            MediaKey::Stop => self.media_stop(),
            MediaKey::Next => self.media_next(),
            MediaKey::Previous => self.media_previous(),
        }
    }

    /// Persist the playing position before the app exits
    pub fn shutdown(&mut self) {
        self.pause_active();
    }

    fn replace_rows(&mut self, tracks: Vec<Track>) {
        let active_id = self
            .active
            .and_then(|index| self.rows.get(index))
            .map(|row| row.track.id);

        self.rows = tracks
            .into_iter()
            .map(|track| {
                let mut row = EpisodeRow::new(track);
                row.downloading = self.downloads.is_queued(row.track.id);
                row
            })
            .collect();
        self.active = active_id.and_then(|id| self.row_index(id));

        match (self.active, active_id) {
            (Some(index), _) => {
                self.rows[index].playing = self.player.status() == PlayerStatus::Playing;
            }
            (None, Some(id)) => {
                debug!("active track {id} left the list, stopping playback");
                if self.player.status() == PlayerStatus::Playing {
                    self.storage.set_track_position(id, self.player.get_position());
                }
                self.player.stop();
            }
            (None, None) => {}
        }
        self.view.rows_replaced(&self.rows);
    }

    fn load_and_play(&mut self, index: usize) -> bool {
        let Some(track) = self.rows.get(index).map(|row| row.track.clone()) else {
            return false;
        };
        let Some(filename) = track.filename.as_deref() else {
            return false;
        };
        let path = self.podcasts_dir.join(filename);

        if let Err(e) = self.player.set_filename(&path) {
            warn!("cannot play '{}': {e}", track.title);
            self.active = None;
            if matches!(e, PlaybackError::MissingFile(_)) {
                self.storage.set_track_no_downloaded(track.id);
                if let Some(row) = self.rows.get_mut(index) {
                    row.track.mark_not_downloaded();
                }
            }
            self.set_playing(index, false);
            return false;
        }

        self.active = Some(index);
        let resume = if track.duration > 0 && track.position >= track.duration {
            0
        } else {
            track.position
        };
        if resume > 0 {
            self.player.set_position(resume);
        }
        self.player.play();

        info!("playing '{}'", track.title);
        self.view.now_playing(&track);
        self.set_playing(index, true);
        true
    }

    fn pause_active(&mut self) -> bool {
        let Some(index) = self.active else {
            return false;
        };
        let paused = self.player.pause();
        if paused {
            self.persist_position(index);
        }
        self.set_playing(index, false);
        paused
    }

    fn on_playback_ended(&mut self, index: usize) {
        self.mark_listened(index);
        if let Some(row) = self.rows.get_mut(index) {
            row.track.position = 0;
            self.storage.set_track_position(row.track.id, 0);
            if let Some(list_id) = row.track.list_id {
                self.storage
                    .set_track_position_in_list(list_id, row.track.id, 0);
            }
        }
        self.set_playing(index, false);

        if !self.auto_advance {
            return;
        }
        if let Some(next) = next_playable(&self.playable_indices(), Some(index))
            && next != index
        {
            self.play_row(next);
        }
    }

    fn finish_download(&mut self, track_id: i64) {
        let Some(track) = self.find_track(track_id) else {
            warn!("finished download for unknown track {track_id}");
            return;
        };
        let filename = local_filename(track.id, &track.url);
        let path = self.podcasts_dir.join(&filename);
        let index = self.row_index(track_id);

        if !path.is_file() {
            warn!(
                "download of track {track_id} ended but {} is missing",
                path.display()
            );
            self.storage.set_track_no_downloaded(track_id);
            if let Some(index) = index {
                self.rows[index].track.mark_not_downloaded();
                self.rows[index].downloading = false;
                self.refresh_row(index);
            }
            return;
        }

        self.storage.set_track_downloaded(track_id, &filename);
        let duration = probe::duration_secs(&path);
        if let Some(seconds) = duration {
            self.storage.set_track_duration(track_id, seconds);
        }
        info!("downloaded '{}' to {}", track.title, path.display());

        if let Some(index) = index {
            let row = &mut self.rows[index];
            row.track.mark_downloaded(filename);
            if let Some(seconds) = duration {
                row.track.duration = seconds;
            }
            row.downloading = false;
            self.refresh_row(index);
        }
    }

    fn discard_download(&mut self, track_id: i64) {
        let Some(track) = self.find_track(track_id) else {
            return;
        };
        let destination = local_path(&self.podcasts_dir, track.id, &track.url);
        remove_local_file(&partial_path(&destination));
        remove_local_file(&destination);

        self.storage.set_track_no_downloaded(track_id);
        if let Some(index) = self.row_index(track_id) {
            self.rows[index].track.mark_not_downloaded();
            self.refresh_row(index);
        }
    }

    fn remove_download(&mut self, index: usize) {
        if self.active == Some(index) {
            self.media_stop();
            self.active = None;
        }
        let Some(row) = self.rows.get_mut(index) else {
            return;
        };
        if let Some(filename) = row.track.filename.as_deref() {
            remove_local_file(&self.podcasts_dir.join(filename));
        }
        self.storage.set_track_no_downloaded(row.track.id);
        row.track.mark_not_downloaded();
        row.playing = false;
        self.refresh_row(index);
    }

    fn mark_listened(&mut self, index: usize) {
        let Some(row) = self.rows.get_mut(index) else {
            return;
        };
        if row.track.listened {
            return;
        }
        row.track.listened = true;
        self.storage.set_track_listened(row.track.id);
        if let Some(list_id) = row.track.list_id {
            self.storage.set_track_listened_in_list(list_id, row.track.id);
        }
        info!("'{}' listened", row.track.title);
    }

    fn persist_position(&mut self, index: usize) {
        let position = self.player.get_position();
        let Some(row) = self.rows.get_mut(index) else {
            return;
        };
        row.track.position = position;
        self.storage.set_track_position(row.track.id, position);
        if let Some(list_id) = row.track.list_id {
            self.storage
                .set_track_position_in_list(list_id, row.track.id, position);
        }
    }

    fn set_playing(&mut self, index: usize, playing: bool) {
        if let Some(row) = self.rows.get_mut(index) {
            row.playing = playing;
        }
        self.refresh_row(index);
        self.update_transport();
    }

    fn set_downloading(&mut self, track_id: i64, downloading: bool) {
        if let Some(index) = self.row_index(track_id) {
            self.rows[index].downloading = downloading;
            self.refresh_row(index);
        }
    }

    fn refresh_row(&mut self, index: usize) {
        if let Some(row) = self.rows.get(index) {
            self.view.row_updated(index, row);
        }
    }

    fn update_transport(&mut self) {
        self.view
            .transport_updated(self.player.status(), self.player.get_relative_position());
    }

    fn playable_indices(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.can_play())
            .map(|(index, _)| index)
            .collect()
    }

    fn row_index(&self, track_id: i64) -> Option<usize> {
        self.rows.iter().position(|row| row.track.id == track_id)
    }

    fn find_track(&self, track_id: i64) -> Option<Track> {
        match self.row_index(track_id) {
            Some(index) => Some(self.rows[index].track.clone()),
            None => self.storage.get_track(track_id),
        }
    }
}
