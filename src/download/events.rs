// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

/// Transitions of the download queue, keyed by track id
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// A request arrived while another transfer was running
    Queued { track_id: i64, pending: usize },

    /// The transfer for a track began
    Started { track_id: i64 },

    /// The transfer completed successfully
    Ended { track_id: i64 },

    /// The transfer failed
    Failed {
        track_id: i64,
        reason: String,
        /// `false` means the queue gave up on this track
        retrying: bool,
    },
}

impl DownloadEvent {
    pub fn track_id(&self) -> i64 {
        match self {
            DownloadEvent::Queued { track_id, .. }
            | DownloadEvent::Started { track_id }
            | DownloadEvent::Ended { track_id }
            | DownloadEvent::Failed { track_id, .. } => *track_id,
        }
    }

    /// Whether this is the last event the track will see for its request
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadEvent::Ended { .. } | DownloadEvent::Failed { retrying: false, .. }
        )
    }
}

/// Observer of download queue transitions.
///
/// Implementations update row icons, progress spinners or logs.
pub trait DownloadObserver: Send + Sync {
    fn report(&self, event: &DownloadEvent);
}

/// A shared reference to a download observer
pub type SharedDownloadObserver = Arc<dyn DownloadObserver>;

/// An observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DownloadObserver for NoopObserver {
    fn report(&self, _event: &DownloadEvent) {}
}

impl NoopObserver {
    pub fn shared() -> SharedDownloadObserver {
        Arc::new(Self)
    }
}
