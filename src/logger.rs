use slog::{o, Discard, Drain, FilterLevel, Level, Logger};

pub const DEFAULT_LOG_LEVEL: FilterLevel = FilterLevel::Info;

/// Terminal logger that drops records below `level`. `Off` yields a discarding logger.
pub fn create_root_logger(level: FilterLevel) -> Logger {
    let level = match Level::from_usize(level.as_usize()) {
        Some(level) => level,
        None => return create_discard_logger(),
    };

    let drain = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(drain).build().fuse();
    let drain = slog_async::Async::new(drain)
        .build()
        .filter_level(level)
        .fuse();
    Logger::root(drain, o!())
}

pub fn create_discard_logger() -> Logger {
    Logger::root(Discard, o!())
}
