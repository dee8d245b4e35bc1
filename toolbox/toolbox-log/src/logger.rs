use core::fmt;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use toolbox_sync::SyncOnceCell;

pub struct HostLogger {
    max_level: LevelFilter,
}

impl HostLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Call this once during early init.
    ///
    /// # Errors
    /// Returns [`SetLoggerError`] if a logger is already installed.
    pub fn init(self) -> Result<(), SetLoggerError> {
        // set_logger expects &'static dyn Log; the cell keeps the logger alive
        static LOGGER: SyncOnceCell<HostLogger> = SyncOnceCell::new();

        let max_level = self.max_level;
        let logger = LOGGER.get_or_init(|| self);
        log::set_logger(logger)?;
        log::set_max_level(max_level);
        Ok(())
    }
}

/// Formats `record` as `"[LEVEL] target: message\n"`.
///
/// # Errors
/// Propagates errors from the writer.
pub fn write_record<W: fmt::Write>(w: &mut W, record: &Record<'_>) -> fmt::Result {
    writeln!(w, "[{}] {}: {}", record.level(), record.target(), record.args())
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line = String::new();
        if write_record(&mut line, record).is_ok() {
            // Ignore errors; this is best-effort diagnostic output.
            let _ = std::io::stderr().write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
