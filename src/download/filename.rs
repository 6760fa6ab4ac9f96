// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use url::Url;

const DEFAULT_EXTENSION: &str = "mp3";
const PARTIAL_SUFFIX: &str = ".partial";

/// Get the audio file extension of an enclosure URL
///
/// Uses the last path segment's extension when it names a known audio
/// format, defaults to "mp3". Query strings and fragments are ignored.
pub fn audio_extension(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()))
        })
        .filter(|ext| is_valid_audio_extension(ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Name of the local file for a track: `podcast_<id>.<ext>`
pub fn local_filename(track_id: i64, url: &str) -> String {
    format!("podcast_{}.{}", track_id, audio_extension(url))
}

/// Full path of the local file for a track
pub fn local_path(podcasts_dir: &Path, track_id: i64, url: &str) -> PathBuf {
    podcasts_dir.join(local_filename(track_id, url))
}

/// Path of the in-progress file written while a transfer runs
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Delete a local episode file; a file that is already gone is not an error
pub fn remove_local_file(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("removed {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("failed to remove {}: {e}", path.display());
            false
        }
    }
}

fn is_valid_audio_extension(ext: &str) -> bool {
    matches!(
        ext,
        "mp3" | "m4a" | "mp4" | "aac" | "ogg" | "oga" | "opus" | "wav" | "flac"
    )
}
