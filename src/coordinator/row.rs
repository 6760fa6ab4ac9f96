// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::Track;
use crate::playback::PlayerStatus;

/// View model of one displayed episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRow {
    pub track: Track,
    /// Requested, queued or transferring
    pub downloading: bool,
    /// Shown with the "playing" state; at most one row at a time
    pub playing: bool,
}

impl EpisodeRow {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            downloading: false,
            playing: false,
        }
    }

    pub fn can_play(&self) -> bool {
        self.track.downloaded && !self.downloading
    }
}

/// Rendering seam implemented by the shell
///
/// All callbacks run on the app loop task.
pub trait EpisodeView {
    /// Rows were reloaded
    fn rows_replaced(&mut self, _rows: &[EpisodeRow]) {}

    fn row_updated(&mut self, _index: usize, _row: &EpisodeRow) {}

    fn transport_updated(&mut self, _status: PlayerStatus, _relative_position: u8) {}

    /// A new episode was loaded into the player
    fn now_playing(&mut self, _track: &Track) {}
}

/// A view that renders nothing
#[derive(Debug, Default)]
pub struct NullView;

impl EpisodeView for NullView {}
