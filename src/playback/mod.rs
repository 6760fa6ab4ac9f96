// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Playback controller.
//!
//! Engines are created through an [`AudioBackend`] and report back through
//! an [`EngineNotifier`]. With the `audio` feature, [`RodioBackend`] plays on
//! the default output device.

mod engine;
#[cfg(feature = "audio")]
mod output;
mod player;

pub use engine::{AudioBackend, AudioEngine, EQ_BANDS, EngineNotifier, EngineSignal};
#[cfg(feature = "audio")]
pub use output::{RodioBackend, RodioEngine};
pub use player::{
    MAX_SPEED, MIN_SPEED, Player, PlayerEvent, PlayerObserver, PlayerStatus, SharedPlayerObserver,
};
