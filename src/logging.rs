use std::{backtrace::Backtrace, panic::PanicHookInfo};

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, RunMode};

/// Installs the global subscriber. `RUST_LOG` wins over `logging.rust_log`.
pub fn init_tracing(logging: &LoggingConfig, run_mode: RunMode) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.rust_log.as_str()));
    let verbose = matches!(run_mode, RunMode::Development);

    fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_line_number(verbose)
        .init();
    std::panic::set_hook(Box::new(log_panic));
    tracing::info!(run_mode = run_mode.as_str(), "tracing initialised");
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    let backtrace = Backtrace::capture();

    match info.location() {
        Some(location) => tracing::error!(
            panic = %message,
            location = %location,
            backtrace = %backtrace,
            "panic"
        ),
        None => tracing::error!(panic = %message, backtrace = %backtrace, "panic"),
    }
}
