use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

/// Set up tracing with a daily-rolling file appender under `logs/`.
/// Filtering follows `RUST_LOG` (e.g. `RUST_LOG=info`). The returned guard
/// must stay alive for the duration of the process or buffered log lines
/// are lost on exit.
pub fn init() -> WorkerGuard {
    let file_appender = rolling::daily("logs", "analytics.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking)
        .with_ansi(false) // no color codes in file
        .init();

    guard
}
