use std::sync::Mutex;

use slog::Drain;
use slog::Fuse;
use slog_async::Async;
use slog_json::Json;

pub use slog::{debug, error, info, o, trace, warn, Logger};

pub fn initialize_logger() -> slog::Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);

    // honours `RUST_LOG` when built with `env_logging`
    #[cfg(feature = "env_logging")]
    let drain = slog_envlogger::new(drain).ignore_res();

    let drain = Async::new(drain).build().fuse();

    Logger::root(
        drain,
        o!("version" => info::VERSION, "revision" => info::REVISION, "build_timestamp" => info::BUILD_TIMESTAMP),
    )
}

/// Returns a logger that drops every record, for tests and tools that
/// have nowhere to send output.
pub fn null_logger() -> slog::Logger {
    Logger::root(slog::Discard, o!())
}
