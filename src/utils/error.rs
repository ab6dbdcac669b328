use thiserror::Error;

/// HTTP statuses worth another attempt.
pub const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Malformed record: {reason}")]
    MalformedRecord { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a failed run. Every failure exits non-zero.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl EtlError {
    /// Whether the failed request may succeed if simply sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::HttpStatus { status, .. } => TRANSIENT_STATUSES.contains(status),
            EtlError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::ApiError(_) | EtlError::HttpStatus { .. } => ErrorCategory::Network,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::MalformedRecord { .. } => ErrorCategory::Data,
            EtlError::IoError(_) | EtlError::StorageError { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::MalformedRecord { .. } => ErrorSeverity::Low,
            EtlError::ApiError(_) | EtlError::HttpStatus { .. } => ErrorSeverity::Medium,
            EtlError::CsvError(_) | EtlError::SerializationError(_) => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::IoError(_)
            | EtlError::StorageError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::MissingConfigError { field } => {
                format!("Set the {} environment variable (or pass it as a flag)", field)
            }
            EtlError::InvalidConfigValueError { field, .. } => {
                format!("Check the value given for {}", field)
            }
            EtlError::ConfigError { .. } => "Review the job configuration".to_string(),
            EtlError::HttpStatus { status, .. } if self.is_retryable() => format!(
                "The API kept answering {}; try again later or raise HTTP_RETRIES",
                status
            ),
            EtlError::HttpStatus { .. } => {
                "Check BASE_URL and TABLE_ENDPOINTS point at an existing resource".to_string()
            }
            EtlError::ApiError(_) => {
                "Check network connectivity to the API and HTTP_TIMEOUT_SECONDS".to_string()
            }
            EtlError::StorageError { .. } | EtlError::IoError(_) => {
                "Check the destination bucket exists and is writable".to_string()
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Inspect the API payload for unexpected content".to_string()
            }
            EtlError::MalformedRecord { .. } => "The record was skipped".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not fetch data from the API: {}", self),
            ErrorCategory::Data => format!("Could not process API data: {}", self),
            ErrorCategory::Storage => format!("Could not write output: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_failure_exits_non_zero() {
        let malformed = EtlError::MalformedRecord {
            reason: "expected a JSON object".to_string(),
        };
        assert_eq!(malformed.severity(), ErrorSeverity::Low);
        assert_eq!(malformed.severity().exit_code(), 1);

        for severity in [
            ErrorSeverity::Low,
            ErrorSeverity::Medium,
            ErrorSeverity::High,
            ErrorSeverity::Critical,
        ] {
            assert_ne!(severity.exit_code(), 0, "{:?}", severity);
        }
        assert_eq!(ErrorSeverity::Medium.exit_code(), 2);
        assert_eq!(ErrorSeverity::Critical.exit_code(), 3);
    }

    fn status(code: u16) -> EtlError {
        EtlError::HttpStatus {
            status: code,
            url: "http://api.test/items".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn test_transient_statuses_are_retryable() {
        for code in TRANSIENT_STATUSES {
            assert!(status(code).is_retryable(), "{} should retry", code);
        }
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(501).is_retryable());
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = EtlError::MissingConfigError {
            field: "BUCKET_NAME".to_string(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.recovery_suggestion().contains("BUCKET_NAME"));
    }
}
