/// Structured logging for the population dashboard
///
/// Provides context-rich logging with data source and municipality
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Ssb,
    Export,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Ssb => write!(f, "SSB"),
            DataSource::Export => write!(f, "EXPORT"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the request itself was wrong (bad period, empty selection)
    Expected,
    /// Unexpected failure - indicates service degradation or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, source: &DataSource, entity: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let entity_part = entity.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, source, entity_part, message)
    }

    fn log(&self, level: LogLevel, source: &DataSource, entity: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, source, entity, message);
        let entity_part = entity.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output goes to stderr so stdout stays clean for tables.
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, entity_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, entity_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}", message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, source: DataSource, entity: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &source, entity, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: DataSource, entity: Option<&str>, message: &str) {
    emit(LogLevel::Info, source, entity, message);
}

/// Log a warning message
pub fn warn(source: DataSource, entity: Option<&str>, message: &str) {
    emit(LogLevel::Warning, source, entity, message);
}

/// Log an error message
pub fn error(source: DataSource, entity: Option<&str>, message: &str) {
    emit(LogLevel::Error, source, entity, message);
}

/// Log a debug message
pub fn debug(source: DataSource, entity: Option<&str>, message: &str) {
    emit(LogLevel::Debug, source, entity, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a pipeline failure based on its error message.
pub fn classify_ssb_failure(error_message: &str) -> FailureType {
    // Caller mistakes: nothing is wrong with the service.
    if error_message.contains("Invalid query") {
        FailureType::Expected
    }
    // 5xx, timeouts and connection failures point at the service or network
    else if error_message.contains("Transport error")
        || error_message.contains("HTTP error: 5")
    {
        FailureType::Unexpected
    }
    // A response we cannot decode suggests the API changed under us
    else if error_message.contains("Data shape error") {
        FailureType::Unexpected
    }
    // API-reported errors and 4xx usually mean the table or codes changed
    else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a pipeline failure with automatic classification
pub fn log_ssb_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_ssb_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(DataSource::Ssb, None, &message),
        FailureType::Unexpected => error(DataSource::Ssb, None, &message),
        FailureType::Unknown => warn(DataSource::Ssb, None, &message),
    }
}

/// Log the outcome of a pipeline run
pub fn log_fetch_summary(operation: &str, requested: usize, received: usize) {
    let message = format!(
        "{} complete: {}/{} cells with values",
        operation, received, requested
    );

    if received == requested {
        info(DataSource::Ssb, None, &message);
    } else if received == 0 {
        error(DataSource::Ssb, None, &message);
    } else {
        warn(DataSource::Ssb, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PopError;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parses_config_names() {
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_failure_classification() {
        let cases = [
            (PopError::InvalidQuery("no values".into()), FailureType::Expected),
            (PopError::TransportError("timed out".into()), FailureType::Unexpected),
            (PopError::HttpError(503), FailureType::Unexpected),
            (PopError::DataShapeError("missing Tid".into()), FailureType::Unexpected),
            (PopError::HttpError(400), FailureType::Unknown),
            (PopError::ApiError("bad code".into()), FailureType::Unknown),
        ];
        for (err, expected) in cases {
            assert_eq!(classify_ssb_failure(&err.to_string()), expected, "for {}", err);
        }
    }

    #[test]
    fn test_format_entry_includes_source_and_entity() {
        let entry = Logger::format_entry(LogLevel::Warning, &DataSource::Ssb, Some("K-1103"), "slow");
        assert!(entry.contains("WARN SSB [K-1103]: slow"), "got {}", entry);
    }
}
