use crate::error::{AppError, Result};
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::OnceCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOG_FILE: &str = "log.txt";

#[derive(Debug)]
struct SimpleLogger {
    log_file: PathBuf,
    level: Level,
}

static LOGGER: OnceCell<SimpleLogger> = OnceCell::new();

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_entry = format!(
                "{} {} [{}] - {}\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            );

            if let Ok(mut file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_file)
            {
                let _ = file.write_all(log_entry.as_bytes());
            }
        }
    }

    fn flush(&self) {}
}

/// Appends log lines to `log.txt` in `dir`. Debug lines are only written when `debug` is set.
pub fn init(dir: &Path, debug: bool) -> Result<()> {
    create_dir_all(dir)?;

    let level = if debug { Level::Debug } else { Level::Info };
    LOGGER
        .set(SimpleLogger {
            log_file: dir.join(LOG_FILE),
            level,
        })
        .map_err(|_| AppError::Config("logger already initialized".to_string()))?;

    if let Some(logger) = LOGGER.get() {
        log::set_logger(logger)?;
        log::set_max_level(if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    }
    Ok(())
}
