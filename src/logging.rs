//! Logger setup for the `recsync` binary.
//!
//! The library only emits through the `log` facade. The binary installs
//! `env_logger`: `warn` by default, `debug` with `-v`. `RUST_LOG` wins over both.

use env_logger::{Builder, Env};

/// Install the global logger. Calling it twice is harmless.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}
