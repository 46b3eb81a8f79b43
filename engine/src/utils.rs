#![allow(unused)]

#[cfg(test)]
pub fn test_logger() -> slog::Logger {
    use slog::{o, Drain};

    let decorator = slog_term::PlainSyncDecorator::new(slog_term::TestStdoutWriter);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    slog::Logger::root(drain, o!())
}
