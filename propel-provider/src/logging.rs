//! Logging initialisation for hosts embedding the provider

use env_logger::Env;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "propel_provider=info,propel_core=info";

/// Install the global logger, ignoring a logger that is already installed
pub fn init_logging() {
    let _ = try_init_logging();
}

pub fn try_init_logging() -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .format_timestamp_millis()
        .try_init()
}
