// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::error::PlaybackError;
use crate::mailbox::Mailbox;

use super::engine::{AudioBackend, AudioEngine, EQ_BANDS, EngineNotifier, EngineSignal};

pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 4.0;
const MIN_GAIN_DB: f64 = -24.0;
const MAX_GAIN_DB: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Transport transitions; the payload is the relative position (0..=100)
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Started(u8),
    Paused(u8),
    /// Manual stop, or the stop forced by an engine error
    Stopped(u8),
    /// End of stream reached
    Ended(u8),
    Failed(String),
    /// Duration in seconds became known
    DurationChanged(u64),
}

pub trait PlayerObserver: Send + Sync {
    fn report(&self, event: &PlayerEvent);
}

pub type SharedPlayerObserver = Arc<dyn PlayerObserver>;

/// Owner of the single audio engine
///
/// Transport calls are guarded by the current status: a call that does not
/// apply in the current state is a no-op returning `false`.
pub struct Player {
    backend: Box<dyn AudioBackend>,
    mailbox: Mailbox,
    engine: Option<Box<dyn AudioEngine>>,
    source: Option<PathBuf>,
    status: PlayerStatus,
    session: u64,
    speed: f64,
    volume: f64,
    equalizer: [f64; EQ_BANDS],
    observers: Vec<SharedPlayerObserver>,
}

impl Player {
    pub fn new(backend: Box<dyn AudioBackend>, mailbox: Mailbox) -> Self {
        Self {
            backend,
            mailbox,
            engine: None,
            source: None,
            status: PlayerStatus::Stopped,
            session: 0,
            speed: 1.0,
            volume: 1.0,
            equalizer: [0.0; EQ_BANDS],
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: SharedPlayerObserver) {
        self.observers.push(observer);
    }

    /// Load a new source, discarding the current engine
    ///
    /// Stored speed, volume and equalizer are applied to the new engine. The
    /// player is `Stopped` afterwards, whether loading succeeded or not.
    pub fn set_filename(&mut self, path: &Path) -> Result<(), PlaybackError> {
        let relative = self.get_relative_position();
        if let Some(mut engine) = self.engine.take() {
            engine.stop();
            if self.status != PlayerStatus::Stopped {
                self.status = PlayerStatus::Stopped;
                self.notify(PlayerEvent::Stopped(relative));
            }
        }
        self.source = None;
        self.session += 1;

        if !path.exists() {
            return Err(PlaybackError::MissingFile(path.to_path_buf()));
        }

        let notifier = EngineNotifier::new(self.mailbox.clone(), self.session);
        let mut engine = self.backend.open(path, notifier)?;
        engine.set_rate(self.speed);
        engine.set_volume(self.volume);
        engine.set_equalizer(&self.equalizer);

        info!("loaded {} (session {})", path.display(), self.session);
        self.engine = Some(engine);
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    pub fn play(&mut self) -> bool {
        if self.status == PlayerStatus::Playing {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            debug!("play ignored: no source loaded");
            return false;
        };
        engine.play();
        self.status = PlayerStatus::Playing;
        self.notify(PlayerEvent::Started(self.get_relative_position()));
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.status != PlayerStatus::Playing {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        engine.pause();
        self.status = PlayerStatus::Paused;
        self.notify(PlayerEvent::Paused(self.get_relative_position()));
        true
    }

    pub fn stop(&mut self) -> bool {
        if self.status == PlayerStatus::Stopped {
            return false;
        }
        let relative = self.get_relative_position();
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
        self.status = PlayerStatus::Stopped;
        self.notify(PlayerEvent::Stopped(relative));
        true
    }

    /// Set the playback rate, clamped to [`MIN_SPEED`]..=[`MAX_SPEED`]
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        if let Some(engine) = self.engine.as_mut() {
            engine.set_rate(self.speed);
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(engine) = self.engine.as_mut() {
            engine.set_volume(self.volume);
        }
    }

    pub fn set_equalizer(&mut self, bands: [f64; EQ_BANDS]) {
        self.equalizer = bands.map(|gain| gain.clamp(MIN_GAIN_DB, MAX_GAIN_DB));
        if let Some(engine) = self.engine.as_mut() {
            engine.set_equalizer(&self.equalizer);
        }
    }

    /// Seek to an absolute position; used to restore a saved position
    pub fn set_position(&mut self, seconds: u64) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        engine.seek(Duration::from_secs(seconds));
        true
    }

    /// Seek to `percent` of the duration, only while playing
    ///
    /// The engine is paused around the flushing seek so the caller never
    /// observes a half-applied seek.
    pub fn set_relative_position(&mut self, percent: u8) -> bool {
        if self.status != PlayerStatus::Playing {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        let Some(duration) = engine.duration().filter(|d| !d.is_zero()) else {
            return false;
        };

        let target = duration.mul_f64(f64::from(percent.min(100)) / 100.0);
        engine.pause();
        engine.seek(target);
        engine.play();
        true
    }

    /// Seconds; 0 when unknown or nothing is loaded
    pub fn get_duration(&self) -> u64 {
        self.engine
            .as_ref()
            .and_then(|engine| engine.duration())
            .map_or(0, |d| d.as_secs())
    }

    pub fn get_position(&self) -> u64 {
        self.engine
            .as_ref()
            .map_or(0, |engine| engine.position().as_secs())
    }

    /// Position as a 0..=100 percentage; 0 while the duration is unknown
    pub fn get_relative_position(&self) -> u8 {
        let Some(engine) = self.engine.as_ref() else {
            return 0;
        };
        match engine.duration() {
            Some(duration) if !duration.is_zero() => {
                let ratio = engine.position().as_secs_f64() / duration.as_secs_f64();
                (ratio * 100.0).round().clamp(0.0, 100.0) as u8
            }
            _ => 0,
        }
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn has_source(&self) -> bool {
        self.engine.is_some()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Apply a signal posted by the engine of `session`
    ///
    /// Returns the resulting event, also delivered to observers. Signals from
    /// a previous session are dropped.
    pub fn handle_signal(&mut self, session: u64, signal: EngineSignal) -> Option<PlayerEvent> {
        if session != self.session || self.engine.is_none() {
            debug!("dropping {signal:?} from stale session {session}");
            return None;
        }

        match signal {
            EngineSignal::EndOfStream => {
                if self.status == PlayerStatus::Stopped {
                    return None;
                }
                let relative = self.get_relative_position();
                self.status = PlayerStatus::Stopped;
                let event = PlayerEvent::Ended(relative);
                self.notify(event.clone());
                Some(event)
            }
            EngineSignal::Error(message) => {
                error!("audio engine error: {message}");
                let relative = self.get_relative_position();
                if let Some(engine) = self.engine.as_mut() {
                    engine.stop();
                }
                self.status = PlayerStatus::Stopped;
                self.notify(PlayerEvent::Stopped(relative));
                let event = PlayerEvent::Failed(message);
                self.notify(event.clone());
                Some(event)
            }
            EngineSignal::DurationChanged => {
                let event = PlayerEvent::DurationChanged(self.get_duration());
                self.notify(event.clone());
                Some(event)
            }
        }
    }

    fn notify(&self, event: PlayerEvent) {
        for observer in &self.observers {
            observer.report(&event);
        }
    }
}
