use crate::error::{CliError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::{Layer, Registry, filter::LevelFilter, fmt, prelude::*};

/// Stderr verbosity: `-q` keeps errors only, each `-v` adds a level.
fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// The log file records launches in detail whatever the terminal shows.
fn file_level(stderr_level: LevelFilter) -> LevelFilter {
    stderr_level.max(LevelFilter::DEBUG)
}

fn file_layer(path: &Path, level: LevelFilter) -> Result<impl Layer<Registry>> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(CliError::Io)?;
    }
    let file = File::create(path).map_err(CliError::Io)?;
    Ok(fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(level))
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_level = level_filter(verbosity, quiet);
    let file = log_file
        .as_deref()
        .map(|path| file_layer(path, file_level(stderr_level)))
        .transpose()?;

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(stderr_level);

    tracing_subscriber::registry().with(file).with(stderr).init();
    Ok(())
}
