use std::{error::Error, fs::File, str::FromStr, sync::Arc};

use dalvacation::dir::DataDirectory;
use tracing_subscriber::{
    filter::{self, LevelFilter},
    prelude::*,
};

pub const LOG_FILE_NAME: &str = "dalvacation.log";

/// Targets of the HTTP stack, too verbose at debug level.
const QUIET_TARGETS: [&str; 5] = ["rustls", "hyper", "reqwest", "mio", "tokio"];

fn is_app_target(target: &str) -> bool {
    !QUIET_TARGETS.iter().any(|quiet| target.starts_with(quiet))
}

/// Events go to stderr and to the log file of the data directory. Stdout is
/// left to the prompts.
pub fn setup_logger(log_level: LevelFilter, datadir: &DataDirectory) -> Result<(), Box<dyn Error>> {
    let file = File::create(datadir.file(LOG_FILE_NAME))?;

    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(false);
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time();

    tracing_subscriber::registry()
        .with(
            stderr_log
                .and_then(file_log)
                .with_filter(log_level)
                .with_filter(filter::filter_fn(|metadata| is_app_target(metadata.target()))),
        )
        .try_init()?;

    Ok(())
}

/// Level requested with the `LOG_LEVEL` environment variable, if any.
pub fn parse_log_level() -> Result<Option<LevelFilter>, Box<dyn Error>> {
    match std::env::var("LOG_LEVEL") {
        Ok(level) if !level.is_empty() => Ok(Some(LevelFilter::from_str(&level)?)),
        _ => Ok(None),
    }
}
