// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use lofty::prelude::*;
use lofty::read_from_path;
use tracing::{debug, warn};

/// Duration of a downloaded audio file in whole seconds
///
/// `None` when the file cannot be read or reports no duration.
pub fn duration_secs(path: &Path) -> Option<u64> {
    match read_from_path(path) {
        Ok(tagged_file) => {
            let secs = tagged_file.properties().duration().as_secs();
            debug!("{} lasts {secs}s", path.display());
            (secs > 0).then_some(secs)
        }
        Err(e) => {
            warn!("unable to probe duration of {}: {e}", path.display());
            None
        }
    }
}
