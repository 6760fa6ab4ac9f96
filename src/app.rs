// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The app loop: the single logical UI task.
//!
//! Owns the coordinator and the receiving end of the mailbox, and drives the
//! position sampling timer. It is driven from the task that created it and
//! never spawned, so the coordinator may hold non-`Send` state.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::coordinator::EpisodeList;
use crate::mailbox::{MailboxReceiver, Message};

pub struct App {
    list: EpisodeList,
    receiver: MailboxReceiver,
    sample_interval: Duration,
}

impl App {
    pub fn new(list: EpisodeList, receiver: MailboxReceiver, sample_interval: Duration) -> Self {
        Self {
            list,
            receiver,
            sample_interval,
        }
    }

    pub fn list(&self) -> &EpisodeList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut EpisodeList {
        &mut self.list
    }

    /// Apply one posted message; `false` asks the loop to stop
    pub fn dispatch(&mut self, message: Message) -> bool {
        match message {
            Message::Transfer(signal) => self.list.handle_transfer(signal),
            Message::Engine { session, signal } => self.list.handle_engine(session, signal),
            Message::Media(key) => {
                if !self.list.media_key(key) {
                    debug!("{key:?} had no effect");
                }
            }
            Message::Shutdown => return false,
        }
        true
    }

    /// Run until a `Shutdown` message arrives or every sender is gone
    pub async fn run(&mut self) {
        let mut ticker = interval(self.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                message = self.receiver.recv() => {
                    let keep_running = match message {
                        Some(message) => self.dispatch(message),
                        None => false,
                    };
                    if !keep_running {
                        break;
                    }
                }
                _ = ticker.tick() => self.list.sample_position(),
            }
        }

        info!("app loop stopped");
        self.list.shutdown();
    }

    /// Process messages until the download queue has nothing left to do
    pub async fn run_until_downloads_idle(&mut self) {
        while !self.list.downloads().is_idle() {
            match self.receiver.recv().await {
                Some(message) => {
                    if !self.dispatch(message) {
                        break;
                    }
                }
                None => break,
            }
        }
        debug!("download queue drained");
    }
}
