// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;
use std::time::Duration;

use crate::error::PlaybackError;
use crate::mailbox::{Mailbox, Message};

/// Number of equalizer bands
pub const EQ_BANDS: usize = 10;

/// Asynchronous notifications raised by an engine on its own thread
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    EndOfStream,
    /// Decode failure, missing file or similar
    Error(String),
    /// The stream's duration became known or changed
    DurationChanged,
}

/// Handle an engine uses to report signals back to the app loop
///
/// Every signal is tagged with the session it was created for, so signals
/// from a torn-down engine can be told apart from the current one.
#[derive(Debug, Clone)]
pub struct EngineNotifier {
    mailbox: Mailbox,
    session: u64,
}

impl EngineNotifier {
    pub(crate) fn new(mailbox: Mailbox, session: u64) -> Self {
        Self { mailbox, session }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn notify(&self, signal: EngineSignal) -> bool {
        self.mailbox.post(Message::Engine {
            session: self.session,
            signal,
        })
    }
}

/// Creates engines for local audio files
pub trait AudioBackend {
    fn open(
        &self,
        path: &Path,
        notifier: EngineNotifier,
    ) -> Result<Box<dyn AudioEngine>, PlaybackError>;
}

/// One loaded audio stream
///
/// All calls are requests into the engine's own processing thread and must
/// not block on state transitions.
pub trait AudioEngine {
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// Flushing seek to an absolute offset
    fn seek(&mut self, position: Duration);
    fn set_rate(&mut self, rate: f64);
    fn set_volume(&mut self, volume: f64);
    /// Gains in dB, lowest band first
    fn set_equalizer(&mut self, bands: &[f64; EQ_BANDS]);
    /// `None` while the stream has not been buffered enough to know
    fn duration(&self) -> Option<Duration>;
    fn position(&self) -> Duration;
}
