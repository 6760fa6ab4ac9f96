// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Audio output on the default device through rodio.
//!
//! Every opened source gets its own engine thread. The thread owns the output
//! stream and the sink, applies commands sent by [`RodioEngine`] and polls the
//! sink to publish the position and detect the end of the stream.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::error::PlaybackError;
use crate::probe;

use super::engine::{AudioBackend, AudioEngine, EQ_BANDS, EngineNotifier, EngineSignal};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Play,
    Pause,
    Stop,
    Seek(Duration),
    Rate(f32),
    Volume(f32),
}

/// Last values published by the engine thread
#[derive(Debug, Default)]
struct Progress {
    position: Duration,
    duration: Option<Duration>,
}

type SharedProgress = Arc<Mutex<Progress>>;

/// Opens local files on the default output device
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioBackend;

impl AudioBackend for RodioBackend {
    fn open(
        &self,
        path: &Path,
        notifier: EngineNotifier,
    ) -> Result<Box<dyn AudioEngine>, PlaybackError> {
        let (commands, inbox) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let progress = SharedProgress::default();

        let worker = EngineWorker {
            path: path.to_path_buf(),
            inbox,
            progress: Arc::clone(&progress),
            notifier,
        };
        thread::Builder::new()
            .name(format!("audio-session-{}", worker.notifier.session()))
            .spawn(move || worker.run(ready_tx))
            .map_err(|e| open_failed(path, e))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(RodioEngine::new(commands, progress))),
            Ok(Err(reason)) => Err(open_failed(path, reason)),
            Err(_) => Err(open_failed(path, "audio thread exited during setup")),
        }
    }
}

fn open_failed(path: &Path, reason: impl ToString) -> PlaybackError {
    PlaybackError::OpenFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Handle to one engine thread
///
/// Dropping it disconnects the command channel, which ends the thread and
/// releases the output device.
pub struct RodioEngine {
    commands: Sender<Command>,
    progress: SharedProgress,
}

impl RodioEngine {
    fn new(commands: Sender<Command>, progress: SharedProgress) -> Self {
        Self { commands, progress }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("audio thread is gone, dropping {command:?}");
        }
    }

    fn set_position(&self, position: Duration) {
        if let Ok(mut progress) = self.progress.lock() {
            progress.position = position;
        }
    }
}

impl AudioEngine for RodioEngine {
    fn play(&mut self) {
        self.send(Command::Play);
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn stop(&mut self) {
        self.send(Command::Stop);
        self.set_position(Duration::ZERO);
    }

    fn seek(&mut self, position: Duration) {
        self.send(Command::Seek(position));
        self.set_position(position);
    }

    fn set_rate(&mut self, rate: f64) {
        self.send(Command::Rate(rate as f32));
    }

    fn set_volume(&mut self, volume: f64) {
        self.send(Command::Volume(volume as f32));
    }

    fn set_equalizer(&mut self, bands: &[f64; EQ_BANDS]) {
        if bands.iter().any(|gain| *gain != 0.0) {
            debug!("rodio output has no equalizer, ignoring {bands:?}");
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.progress
            .lock()
            .ok()
            .and_then(|progress| progress.duration)
    }

    fn position(&self) -> Duration {
        self.progress
            .lock()
            .map_or(Duration::ZERO, |progress| progress.position)
    }
}

struct EngineWorker {
    path: PathBuf,
    inbox: Receiver<Command>,
    progress: SharedProgress,
    notifier: EngineNotifier,
}

impl EngineWorker {
    fn run(self, ready: SyncSender<Result<(), String>>) {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(format!("no audio output: {e}")));
                return;
            }
        };
        stream.log_on_drop(false);

        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        let duration = match self.load(&sink) {
            Ok(duration) => duration,
            Err(reason) => {
                let _ = ready.send(Err(reason));
                return;
            }
        };
        self.publish(|progress| progress.duration = duration);
        if ready.send(Ok(())).is_err() {
            return;
        }
        if duration.is_some() {
            self.notifier.notify(EngineSignal::DurationChanged);
        }

        let mut playing = false;
        loop {
            match self.inbox.recv_timeout(POLL_INTERVAL) {
                Ok(command) => playing = self.apply(&sink, command, playing),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if playing && sink.empty() {
                playing = false;
                self.publish(|progress| {
                    progress.position = progress.duration.unwrap_or(progress.position);
                });
                self.notifier.notify(EngineSignal::EndOfStream);
            } else if !sink.empty() {
                let position = sink.get_pos();
                self.publish(|progress| progress.position = position);
            }
        }

        sink.stop();
        debug!("audio session {} closed", self.notifier.session());
    }

    /// Apply one command; returns whether the sink is playing afterwards
    fn apply(&self, sink: &Sink, command: Command, playing: bool) -> bool {
        match command {
            Command::Play => {
                if sink.empty()
                    && let Err(reason) = self.load(sink)
                {
                    self.notifier.notify(EngineSignal::Error(reason));
                    return false;
                }
                sink.play();
                true
            }
            Command::Pause => {
                sink.pause();
                false
            }
            Command::Stop => {
                sink.clear();
                if let Err(reason) = self.load(sink) {
                    self.notifier.notify(EngineSignal::Error(reason));
                }
                false
            }
            Command::Seek(position) => {
                if let Err(e) = sink.try_seek(position) {
                    warn!("seek to {}s failed: {e}", position.as_secs());
                }
                playing
            }
            Command::Rate(rate) => {
                sink.set_speed(rate);
                playing
            }
            Command::Volume(volume) => {
                sink.set_volume(volume);
                playing
            }
        }
    }

    /// Decode the file and queue it on the (paused) sink
    fn load(&self, sink: &Sink) -> Result<Option<Duration>, String> {
        let file = File::open(&self.path)
            .map_err(|e| format!("cannot open {}: {e}", self.path.display()))?;
        let byte_len = file.metadata().map(|meta| meta.len()).ok();

        let mut builder = Decoder::builder()
            .with_data(BufReader::new(file))
            .with_seekable(true);
        if let Some(byte_len) = byte_len {
            builder = builder.with_byte_len(byte_len);
        }
        if let Some(extension) = self.path.extension().and_then(|ext| ext.to_str()) {
            builder = builder.with_hint(extension);
        }
        let source = builder
            .build()
            .map_err(|e| format!("cannot decode {}: {e}", self.path.display()))?;

        let duration = source
            .total_duration()
            .or_else(|| probe::duration_secs(&self.path).map(Duration::from_secs));
        sink.append(source);
        Ok(duration)
    }

    fn publish(&self, update: impl FnOnce(&mut Progress)) {
        if let Ok(mut progress) = self.progress.lock() {
            update(&mut progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::Mailbox;
    use tempfile::tempdir;

    fn engine() -> (RodioEngine, Receiver<Command>, SharedProgress) {
        let (commands, inbox) = mpsc::channel();
        let progress = SharedProgress::default();
        (
            RodioEngine::new(commands, Arc::clone(&progress)),
            inbox,
            progress,
        )
    }

    #[test]
    fn transport_calls_become_engine_commands() {
        let (mut engine, inbox, _) = engine();

        engine.play();
        engine.set_rate(1.5);
        engine.set_volume(0.5);
        engine.pause();
        engine.stop();

        let received: Vec<Command> = inbox.try_iter().collect();
        assert_eq!(
            received,
            vec![
                Command::Play,
                Command::Rate(1.5),
                Command::Volume(0.5),
                Command::Pause,
                Command::Stop,
            ]
        );
    }

    #[test]
    fn seek_and_stop_update_the_position_immediately() {
        let (mut engine, _inbox, progress) = engine();
        progress.lock().unwrap().duration = Some(Duration::from_secs(300));

        engine.seek(Duration::from_secs(90));
        assert_eq!(engine.position(), Duration::from_secs(90));
        assert_eq!(engine.duration(), Some(Duration::from_secs(300)));

        engine.stop();
        assert_eq!(engine.position(), Duration::ZERO);
    }

    #[test]
    fn commands_after_the_thread_ended_are_dropped() {
        let (mut engine, inbox, _) = engine();
        drop(inbox);

        engine.play();
        engine.seek(Duration::from_secs(5));

        assert_eq!(engine.position(), Duration::from_secs(5));
    }

    #[test]
    fn undecodable_file_fails_to_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("podcast_1.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();
        let (mailbox, _receiver) = Mailbox::channel();

        // fails on the missing device or on the decoder, never opens
        let result = RodioBackend.open(&path, EngineNotifier::new(mailbox, 1));

        assert!(matches!(result, Err(PlaybackError::OpenFailed { .. })));
    }
}
