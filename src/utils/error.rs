use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Required column '{column}' is missing from the {table} table")]
    MissingColumnError { table: String, column: String },

    #[error("Privacy check failed: forbidden token '{token}' found {occurrences} time(s) in output")]
    PrivacyViolationError { token: String, occurrences: usize },

    #[error("Refusing to overwrite source file: {path}")]
    OverwriteSourceError { path: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Schema,
    Privacy,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::OverwriteSourceError { .. } => ErrorCategory::Configuration,
            EtlError::MissingColumnError { .. } | EtlError::CsvError(_) => ErrorCategory::Schema,
            EtlError::PrivacyViolationError { .. } => ErrorCategory::Privacy,
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Io => ErrorSeverity::Medium,
            ErrorCategory::Schema | ErrorCategory::Processing | ErrorCategory::Privacy => {
                ErrorSeverity::High
            }
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// 退出碼，對應嚴重程度
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::IoError(e) => format!("Could not read or write a file: {}", e),
            EtlError::CsvError(e) => format!("The input is not a well-formed CSV file: {}", e),
            EtlError::MissingColumnError { table, column } => {
                format!("The {} file has no '{}' column", table, column)
            }
            EtlError::PrivacyViolationError { token, occurrences } => format!(
                "Anonymized output still contains '{}' ({} occurrence(s)); nothing was written",
                token, occurrences
            ),
            EtlError::OverwriteSourceError { path } => {
                format!("Output path '{}' is the input file", path)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::IoError(_) => "Check that the path exists and is writable".to_string(),
            EtlError::CsvError(_) => {
                "Make sure the file is comma separated and has a header row".to_string()
            }
            EtlError::MissingColumnError { column, .. } => format!(
                "Rename the header to '{}' or add an alias under [columns] in the config file",
                column
            ),
            EtlError::PrivacyViolationError { .. } => {
                "Add an anonymization rule or a column alias for the field carrying this value"
                    .to_string()
            }
            EtlError::OverwriteSourceError { .. } => {
                "Pass a different --output path".to_string()
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Fix the configuration file and run again".to_string()
            }
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                "Inspect the input data; run with --verbose for details".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
