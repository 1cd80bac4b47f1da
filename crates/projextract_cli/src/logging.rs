use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter, e.g. `PROJEXTRACT_LOG=trace`.
pub const C_ENV_LOG_FILTER: &str = "PROJEXTRACT_LOG";

/// Install the stderr subscriber. `verbose` raises the default level to
/// `debug`; an explicit filter in the environment wins.
pub fn init_logger(verbose: bool) {
    let c_level_default = if verbose { "debug" } else { "info" };
    let filter_layer = EnvFilter::try_from_env(C_ENV_LOG_FILTER)
        .unwrap_or_else(|_| EnvFilter::new(c_level_default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_layer)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}
