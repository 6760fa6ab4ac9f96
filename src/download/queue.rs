// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::model::Track;

use super::events::{DownloadEvent, SharedDownloadObserver};
use super::filename::local_path;

/// One episode awaiting or undergoing transfer
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub track_id: i64,
    pub url: String,
    pub destination: PathBuf,
}

impl TransferRequest {
    pub fn for_track(track: &Track, podcasts_dir: &Path) -> Self {
        Self {
            track_id: track.id,
            url: track.url.clone(),
            destination: local_path(podcasts_dir, track.id, &track.url),
        }
    }
}

impl PartialEq for TransferRequest {
    fn eq(&self, other: &Self) -> bool {
        self.track_id == other.track_id
    }
}

/// Starts the actual network transfer for a request
///
/// Implementations must eventually report, through the UI mailbox, a start
/// followed by exactly one of end or failure for every launched request.
pub trait TransferLauncher {
    fn launch(&self, request: &TransferRequest);
}

/// What `request` did with a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Started,
    Queued,
    /// The track is already current or pending
    Duplicate,
}

#[derive(Debug, Clone)]
struct Transfer {
    request: TransferRequest,
    retries: u32,
}

/// Serializes episode downloads: at most one transfer runs at a time
///
/// New requests are pushed to the front of `pending` and the next transfer
/// is taken from the back. A failed transfer goes back to the front until it
/// has been retried `max_retries` times, then it is dropped.
pub struct DownloadQueue {
    launcher: Box<dyn TransferLauncher>,
    current: Option<Transfer>,
    pending: VecDeque<Transfer>,
    max_retries: u32,
    observers: Vec<SharedDownloadObserver>,
}

impl DownloadQueue {
    pub fn new(launcher: Box<dyn TransferLauncher>, max_retries: u32) -> Self {
        Self {
            launcher,
            current: None,
            pending: VecDeque::new(),
            max_retries,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: SharedDownloadObserver) {
        self.observers.push(observer);
    }

    /// Start `request` now if idle, otherwise queue it
    pub fn request(&mut self, request: TransferRequest) -> RequestOutcome {
        if self.is_queued(request.track_id) {
            debug!("track {} already scheduled for download", request.track_id);
            return RequestOutcome::Duplicate;
        }

        let transfer = Transfer {
            request,
            retries: 0,
        };

        if self.current.is_none() {
            self.start(transfer);
            return RequestOutcome::Started;
        }

        let track_id = transfer.request.track_id;
        self.pending.push_front(transfer);
        self.notify(DownloadEvent::Queued {
            track_id,
            pending: self.pending.len(),
        });
        RequestOutcome::Queued
    }

    pub fn on_transfer_started(&mut self, track_id: i64) {
        if !self.is_current(track_id) {
            warn!("ignoring start signal for track {track_id}: not the current transfer");
            return;
        }
        self.notify(DownloadEvent::Started { track_id });
    }

    pub fn on_transfer_ended(&mut self, track_id: i64) {
        if !self.is_current(track_id) {
            warn!("ignoring end signal for track {track_id}: not the current transfer");
            return;
        }
        info!("download of track {track_id} finished");
        self.current = None;
        self.notify(DownloadEvent::Ended { track_id });
        self.start_next();
    }

    pub fn on_transfer_failed(&mut self, track_id: i64, reason: &str) {
        if !self.is_current(track_id) {
            warn!("ignoring failure signal for track {track_id}: not the current transfer");
            return;
        }
        let Some(mut transfer) = self.current.take() else {
            return;
        };

        let retrying = transfer.retries < self.max_retries;
        if retrying {
            transfer.retries += 1;
            warn!(
                "download of track {track_id} failed ({reason}), retry {}/{}",
                transfer.retries, self.max_retries
            );
            self.pending.push_front(transfer);
        } else {
            warn!(
                "download of track {track_id} failed ({reason}), giving up after {} retries",
                transfer.retries
            );
        }

        self.notify(DownloadEvent::Failed {
            track_id,
            reason: reason.to_string(),
            retrying,
        });
        self.start_next();
    }

    /// Track id of the running transfer
    pub fn current(&self) -> Option<i64> {
        self.current.as_ref().map(|t| t.request.track_id)
    }

    /// Pending track ids in the order they will be started
    pub fn pending(&self) -> Vec<i64> {
        self.pending
            .iter()
            .rev()
            .map(|t| t.request.track_id)
            .collect()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Whether the track is running or waiting
    pub fn is_queued(&self, track_id: i64) -> bool {
        self.is_current(track_id) || self.pending.iter().any(|t| t.request.track_id == track_id)
    }

    fn is_current(&self, track_id: i64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| t.request.track_id == track_id)
    }

    fn start_next(&mut self) {
        match self.pending.pop_back() {
            Some(next) => self.start(next),
            None => debug!("download queue idle"),
        }
    }

    fn start(&mut self, transfer: Transfer) {
        debug!(
            "launching transfer of track {} to {}",
            transfer.request.track_id,
            transfer.request.destination.display()
        );
        self.launcher.launch(&transfer.request);
        self.current = Some(transfer);
    }

    fn notify(&self, event: DownloadEvent) {
        for observer in &self.observers {
            observer.report(&event);
        }
    }
}
