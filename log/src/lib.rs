use std::env;
use std::sync::Mutex;

use slog::{Drain, Fuse, Level};
use slog_async::Async;
use slog_json::Json;

pub use slog::{crit, debug, error, info, o, trace, warn, Discard, Level as LogLevel, Logger};

/// The environment variable naming the minimum level to emit.
pub const LEVEL_VARIABLE: &str = "TRACKER_LOG_LEVEL";

/// Creates the root JSON logger, filtered to the level named by
/// [`LEVEL_VARIABLE`] (`info` if unset or unrecognized).
pub fn initialize_logger() -> Logger {
    let level = env::var(LEVEL_VARIABLE)
        .ok()
        .and_then(|name| name.parse::<Level>().ok())
        .unwrap_or(Level::Info);

    initialize_logger_at(level)
}

pub fn initialize_logger_at(level: Level) -> Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);

    #[cfg(feature = "env_logging")]
    let drain = slog_envlogger::new(drain).fuse();

    let drain = drain.filter_level(level).fuse();
    let drain = Async::new(drain).build().fuse();

    Logger::root(
        drain,
        o!("name" => info::NAME, "version" => info::VERSION, "revision" => info::REVISION, "build_timestamp" => info::BUILD_TIMESTAMP),
    )
}

/// A logger that swallows everything, for tests and tools.
pub fn discard() -> Logger {
    Logger::root(Discard, o!())
}
