// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::DownloadError;
use crate::http::HttpClient;

use super::filename::partial_path;

/// Stream `url` to `destination`
///
/// The body is written to `<destination>.partial` and renamed once complete,
/// so `destination` only ever holds a finished file. On error the partial
/// file is left behind for the failure observer to remove.
/// Returns the number of bytes written.
pub async fn fetch_to_file<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    destination: &Path,
) -> Result<u64, DownloadError> {
    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if response.status >= 400 {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    let partial = partial_path(destination);
    let mut file = File::create(&partial)
        .await
        .map_err(|e| DownloadError::FileCreateFailed {
            path: partial.clone(),
            source: e,
        })?;

    let mut bytes_written: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: partial.clone(),
                source: e,
            })?;

        bytes_written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: partial.clone(),
            source: e,
        })?;
    drop(file);

    tokio::fs::rename(&partial, destination)
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: destination.to_path_buf(),
            source: e,
        })?;

    debug!(
        "wrote {bytes_written} bytes from {url} to {}",
        destination.display()
    );
    Ok(bytes_written)
}
