//! Logging initialization for the feedpager binary.
//!
//! Stdout belongs to the interactive session, so logs go to `./pager.log`
//! unless `FEEDPAGER_LOG_TO` says otherwise. The level comes from
//! `FEEDPAGER_LOG` (info when unset).

use std::fs::File;
use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const LOG_DESTINATION_ENV: &str = "FEEDPAGER_LOG_TO";

const LOG_FILE: &str = "./pager.log";

/// Where log records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    /// `./pager.log` in the current directory.
    File,
    /// Stderr, keeping stdout free for the session.
    Terminal,
    Both,
}

impl LogDestination {
    /// Accepts `file`, `terminal` (or `term`, `stderr`) and `both`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "terminal" | "term" | "stderr" => Some(Self::Terminal),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    /// Reads [`LOG_DESTINATION_ENV`] through `env`, defaulting to [`LogDestination::File`].
    pub fn from_env<E>(env: E) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        match env(LOG_DESTINATION_ENV) {
            Some(raw) => Self::parse(&raw).unwrap_or_else(|| {
                eprintln!("feedpager: ignoring {LOG_DESTINATION_ENV}={raw:?}, logging to file");
                Self::File
            }),
            None => Self::File,
        }
    }
}

pub fn initialize(destination: LogDestination) {
    let level = pager_logging::level_from_env(LevelFilter::Info);
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if matches!(destination, LogDestination::Terminal | LogDestination::Both) {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if matches!(destination, LogDestination::File | LogDestination::Both) {
        if let Some(file_logger) = create_file_logger(level, config) {
            loggers.push(file_logger);
        }
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    let log_path = PathBuf::from(LOG_FILE);
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("feedpager: could not create log file {log_path:?}: {err}");
            None
        }
    }
}
