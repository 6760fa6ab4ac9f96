// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing_subscriber::EnvFilter;

/// Map a `-v` count to a default filter directive
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "upodcatcher=warn",
        1 => "upodcatcher=info",
        2 => "upodcatcher=debug",
        _ => "upodcatcher=trace",
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the verbosity-derived default. Output goes
/// to stderr so it does not interleave with command output on stdout.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
