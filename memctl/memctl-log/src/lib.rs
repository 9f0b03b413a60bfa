//! # Console Logger
//!
//! A minimal [`log`] backend for the inspection tools. Records are written as
//! `[LEVEL] target: message` lines to standard error, keeping standard output
//! free for dumps and other command output.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{self, Write};
use std::sync::OnceLock;

pub struct ConsoleLogger {
    max_level: LevelFilter,
}

impl ConsoleLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Install the logger for the whole process. Call this once during startup.
    ///
    /// # Errors
    /// Returns [`SetLoggerError`] if a logger was already installed, including
    /// by an earlier call to this function.
    pub fn init(self) -> Result<&'static Self, SetLoggerError> {
        static LOGGER: OnceLock<ConsoleLogger> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| self);
        log::set_logger(logger)?;
        log::set_max_level(logger.max_level);
        Ok(logger)
    }

    /// Format one record into `out`.
    ///
    /// # Errors
    /// Propagates write errors from `out`.
    pub fn write_record<W>(&self, out: &mut W, record: &Record<'_>) -> io::Result<()>
    where
        W: Write + ?Sized,
    {
        // Format: "[LEVEL] target: message\n"
        writeln!(
            out,
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !cfg!(feature = "enabled") || !self.enabled(record.metadata()) {
            return;
        }

        // Nowhere left to report a failing stderr.
        let _ = self.write_record(&mut io::stderr().lock(), record);
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn render(logger: &ConsoleLogger, level: Level, target: &str, msg: &str) -> String {
        let mut out = Vec::new();
        logger
            .write_record(
                &mut out,
                &Record::builder()
                    .level(level)
                    .target(target)
                    .args(format_args!("{msg}"))
                    .build(),
            )
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn formats_level_target_message() {
        let logger = ConsoleLogger::new(LevelFilter::Debug);
        assert_eq!(
            render(&logger, Level::Warn, "memctl_vmem::bypass", "skipping page"),
            "[WARN] memctl_vmem::bypass: skipping page\n"
        );
    }

    #[test]
    fn filters_by_level() {
        let logger = ConsoleLogger::new(LevelFilter::Info);
        let info = Metadata::builder().level(Level::Info).build();
        let trace = Metadata::builder().level(Level::Trace).build();
        assert!(logger.enabled(&info));
        assert!(!logger.enabled(&trace));
    }
}
