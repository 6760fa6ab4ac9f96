// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod events;
mod fetch;
mod filename;
mod launcher;
mod queue;

pub use events::{DownloadEvent, DownloadObserver, NoopObserver, SharedDownloadObserver};
pub use fetch::fetch_to_file;
pub use filename::{audio_extension, local_filename, local_path, partial_path, remove_local_file};
pub use launcher::TokioLauncher;
pub use queue::{DownloadQueue, RequestOutcome, TransferLauncher, TransferRequest};
