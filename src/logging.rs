/// Structured logging for the charging site analysis
///
/// Provides context-rich logging with pipeline stage and element
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging for long unattended runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
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

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Overpass,
    Cache,
    Extract,
    Group,
    Aggregate,
    Output,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Overpass => write!(f, "OVERPASS"),
            Stage::Cache => write!(f, "CACHE"),
            Stage::Extract => write!(f, "EXTRACT"),
            Stage::Group => write!(f, "GROUP"),
            Stage::Aggregate => write!(f, "AGGREGATE"),
            Stage::Output => write!(f, "OUTPUT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the public endpoint is rate limiting or busy
    Expected,
    /// Unexpected failure - indicates a bad query, endpoint or response format
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

        if let Ok(mut guard) = LOGGER.lock() {
            *guard = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, stage: Stage, element: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let element_part = element.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, stage, element_part, message)
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, stage: Stage, element: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, stage, element, message);
        let element_part = element.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, element_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, element_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
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
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
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

fn log(level: LogLevel, stage: Stage, element: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, element, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, element: Option<&str>, message: &str) {
    log(LogLevel::Info, stage, element, message);
}

/// Log a warning message
pub fn warn(stage: Stage, element: Option<&str>, message: &str) {
    log(LogLevel::Warning, stage, element, message);
}

/// Log an error message
pub fn error(stage: Stage, element: Option<&str>, message: &str) {
    log(LogLevel::Error, stage, element, message);
}

/// Log a debug message
pub fn debug(stage: Stage, element: Option<&str>, message: &str) {
    log(LogLevel::Debug, stage, element, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify an Overpass retrieval failure based on the error message
pub fn classify_overpass_failure(error_message: &str) -> FailureType {
    // 429 and 504 are the public instances' "too many requests" and
    // "server busy" answers; retrying later usually works.
    if error_message.contains("HTTP error: 429") || error_message.contains("HTTP error: 504") {
        FailureType::Expected
    }
    // Other HTTP errors usually mean a bad query or endpoint
    else if error_message.contains("HTTP error") {
        FailureType::Unexpected
    }
    // Parse errors suggest a truncated download or a format change
    else if error_message.contains("Parse error") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log an Overpass failure with automatic classification
pub fn log_overpass_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_overpass_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => warn(Stage::Overpass, None, &message),
        FailureType::Unexpected => error(Stage::Overpass, None, &message),
        FailureType::Unknown => warn(Stage::Overpass, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Exclusion Summary Logging
// ---------------------------------------------------------------------------

/// Log how many points were kept out of grouping
pub fn log_exclusion_summary(total: usize, excluded: usize) {
    let message = format!(
        "{}/{} charging stations excluded from grouping (sites or capacity above limit)",
        excluded, total
    );

    if excluded == 0 {
        debug(Stage::Group, None, &message);
    } else if excluded == total {
        warn(Stage::Group, None, &message);
    } else {
        info(Stage::Group, None, &message);
    }
}
