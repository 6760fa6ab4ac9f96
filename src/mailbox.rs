// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The "post to UI thread" primitive.
//!
//! Transfer tasks and audio engine threads never touch coordinator state.
//! They post a [`Message`] here and the app loop applies it on its own task.

use tokio::sync::mpsc;
use tracing::debug;

use crate::playback::EngineSignal;

/// Completion callbacks of one episode transfer
#[derive(Debug, Clone, PartialEq)]
pub enum TransferSignal {
    Started { track_id: i64 },
    Ended { track_id: i64 },
    Failed { track_id: i64, reason: String },
}

impl TransferSignal {
    pub fn track_id(&self) -> i64 {
        match self {
            TransferSignal::Started { track_id }
            | TransferSignal::Ended { track_id }
            | TransferSignal::Failed { track_id, .. } => *track_id,
        }
    }
}

/// Transport keys pressed in the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKey {
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Transfer(TransferSignal),
    Media(MediaKey),
    /// A signal from the audio engine loaded for playback session `session`
    Engine { session: u64, signal: EngineSignal },
    Shutdown,
}

/// Sending half, cloned into every background producer
#[derive(Debug, Clone)]
pub struct Mailbox {
    tx: mpsc::UnboundedSender<Message>,
}

/// Receiving half, owned by the app loop
#[derive(Debug)]
pub struct MailboxReceiver {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Mailbox {
    pub fn channel() -> (Mailbox, MailboxReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Mailbox { tx }, MailboxReceiver { rx })
    }

    /// Queue `message` for the app loop
    ///
    /// Never blocks, so it is safe to call from engine threads outside the
    /// runtime. Returns `false` once the app loop has gone away.
    pub fn post(&self, message: Message) -> bool {
        match self.tx.send(message) {
            Ok(()) => true,
            Err(e) => {
                debug!("mailbox closed, dropping {:?}", e.0);
                false
            }
        }
    }
}

impl MailboxReceiver {
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Next message if one is already waiting
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}
