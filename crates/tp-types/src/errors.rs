use thiserror::Error;

/// Main error type for torpor
#[derive(Error, Debug)]
pub enum TpError {
    #[error("Baseline error: {0}")]
    Baseline(#[from] BaselineError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TpError {
    /// True for errors caused by the run's inputs rather than by the
    /// benchmark runner. These are never retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TpError::Config(_) | TpError::Baseline(_) | TpError::Search(_)
        )
    }

    /// True for failures of the external benchmark runner.
    pub fn is_execution(&self) -> bool {
        matches!(self, TpError::Execution(_))
    }
}

/// Baseline-related errors
#[derive(Error, Debug)]
pub enum BaselineError {
    #[error("Benchmark {name} is not part of the baseline for category {category}")]
    MissingBenchmark { name: String, category: String },

    #[error("No benchmarks in the baseline for category {category}")]
    NoBenchmarksForCategory { category: String },

    #[error("Invalid baseline format: {message}")]
    InvalidFormat { message: String },

    #[error("Invalid result for benchmark {name}: {value}")]
    InvalidResult { name: String, value: String },
}

/// Errors from launching the external benchmark runner
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to launch `{command}`: {message}")]
    SpawnFailed { command: String, message: String },

    #[error("Non-zero exit code ({}):\n{command}\nstdout:\n{stdout}\nstderr:\n{stderr}", exit_label(.exit_code))]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Malformed benchmark output from `{command}`: {message}\nstdout:\n{stdout}")]
    MalformedOutput {
        command: String,
        message: String,
        stdout: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// Search-technique errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Only one parameter can be searched at a time, got {count}")]
    TooManyParameters { count: usize },

    #[error("Search space has no parameters")]
    NoParameters,

    #[error("Invalid bounds for parameter {name}: min {min} is greater than max {max}")]
    InvalidBounds { name: String, min: i64, max: i64 },
}

/// Result type alias for torpor operations
pub type TpResult<T> = Result<T, TpError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::TpError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::TpError::Config(format!($($arg)*))
    };
}
