//! Bridges the `log` facade to a host-provided logger.
//!
//! The SDK logs through the standard [`log`] macros; hosts that want those
//! records (e.g. to route them into os_log or logcat) implement [`Logger`]
//! and register it once with [`set_logger`]. Without a registered logger,
//! records fall back to stderr.

use std::sync::{Arc, OnceLock};

/// A sink for SDK log records, implemented by the host.
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait Logger: Send + Sync {
    /// Records a message at the given level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum LogLevel {
    /// Very detailed diagnostics.
    Trace,
    /// Debugging information.
    Debug,
    /// Progress of normal operation.
    Info,
    /// Potentially harmful situations.
    Warn,
    /// Errors that still allow the SDK to continue.
    Error,
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Forwards `log` records to the registered [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        // Debug/trace records from dependencies are dropped; only this
        // crate's detailed records are forwarded.
        let is_record_from_trackkit = record
            .module_path()
            .is_some_and(|module_path| module_path.starts_with("trackkit"));
        let is_debug_or_trace_level =
            record.level() == log::Level::Debug || record.level() == log::Level::Trace;
        if is_debug_or_trace_level && !is_record_from_trackkit {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Registers the host logger and installs the forwarding bridge.
///
/// Call once during host startup, before the SDK is used. A second call is
/// ignored.
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        log::warn!("logger already set");
        return;
    }

    if let Err(err) = init_logger() {
        eprintln!("Failed to set logger: {err}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct CollectingLogger {
        records: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Logger for CollectingLogger {
        fn log(&self, level: LogLevel, message: String) {
            self.records.lock().unwrap().push((level, message));
        }
    }

    #[test]
    fn test_records_are_forwarded_to_the_host_logger() {
        let collector = Arc::new(CollectingLogger {
            records: Mutex::new(Vec::new()),
        });
        set_logger(Arc::clone(&collector) as Arc<dyn Logger>);

        log::info!("session check");

        let records = collector.records.lock().unwrap();
        assert!(records
            .iter()
            .any(|(level, message)| *level == LogLevel::Info && message == "session check"));
    }
}
