// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod app;
pub mod config;
pub mod coordinator;
pub mod download;
pub mod error;
pub mod feed;
pub mod http;
pub mod library;
pub mod logging;
pub mod mailbox;
pub mod model;
pub mod playback;
pub mod probe;
pub mod storage;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use app::App;
pub use config::Config;
pub use coordinator::{EpisodeList, EpisodeRow, EpisodeView, NullView};
pub use download::{
    DownloadEvent, DownloadObserver, DownloadQueue, NoopObserver, SharedDownloadObserver,
    TokioLauncher, TransferRequest,
};
pub use error::{ConfigError, DownloadError, FeedError, LibraryError, PlaybackError, StorageError};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use library::Library;
pub use mailbox::{Mailbox, MailboxReceiver, MediaKey, Message, TransferSignal};
pub use model::{ALL_LIST_ID, Feed, List, Track};
#[cfg(feature = "audio")]
pub use playback::RodioBackend;
pub use playback::{
    AudioBackend, AudioEngine, EngineNotifier, EngineSignal, Player, PlayerEvent, PlayerStatus,
};
pub use storage::{Database, Storage};
