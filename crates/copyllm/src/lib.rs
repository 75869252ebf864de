pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

/// Install the stderr log subscriber. `verbosity` below zero keeps only errors.
pub fn init(verbosity: i8) {
    let level = match verbosity {
        i8::MIN..=-1 => tracing::Level::ERROR,
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}
