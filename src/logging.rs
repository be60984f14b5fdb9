//! Logging initialization

/// Initialize `env_logger` for the binaries.
///
/// Defaults to `info` (`debug` when `verbose`); `RUST_LOG` overrides both.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}
