use slog::{o, Drain, Logger};

/// Root logger used when the caller does not supply one.
///
/// Terminal output, filtered by `RUST_LOG`, written from a background thread.
pub fn default_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).fuse();
    let drain = slog_async::Async::new(drain)
        .overflow_strategy(slog_async::OverflowStrategy::DropAndReport)
        .chan_size(16000)
        .build()
        .fuse();
    Logger::root(drain, o!())
}

#[cfg(test)]
pub use self::testing::*;
