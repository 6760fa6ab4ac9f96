// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use tracing::debug;

use crate::http::HttpClient;
use crate::mailbox::{Mailbox, Message, TransferSignal};

use super::fetch::fetch_to_file;
use super::queue::{TransferLauncher, TransferRequest};

/// Runs each transfer on a detached tokio task
///
/// The task posts `Started`, then exactly one of `Ended` or `Failed`.
/// Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct TokioLauncher {
    client: Arc<dyn HttpClient>,
    mailbox: Mailbox,
}

impl TokioLauncher {
    pub fn new(client: Arc<dyn HttpClient>, mailbox: Mailbox) -> Self {
        Self { client, mailbox }
    }
}

impl TransferLauncher for TokioLauncher {
    fn launch(&self, request: &TransferRequest) {
        let client = Arc::clone(&self.client);
        let mailbox = self.mailbox.clone();
        let request = request.clone();

        tokio::spawn(async move {
            let track_id = request.track_id;
            mailbox.post(Message::Transfer(TransferSignal::Started { track_id }));

            let signal =
                match fetch_to_file(client.as_ref(), &request.url, &request.destination).await {
                    Ok(bytes) => {
                        debug!("track {track_id}: {bytes} bytes transferred");
                        TransferSignal::Ended { track_id }
                    }
                    Err(e) => TransferSignal::Failed {
                        track_id,
                        reason: e.to_string(),
                    },
                };
            mailbox.post(Message::Transfer(signal));
        });
    }
}
