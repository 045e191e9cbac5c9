use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceBoardError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API returned {status}: {}", .server_message.as_deref().unwrap_or("no error message"))]
    ApiStatus {
        status: u16,
        server_message: Option<String>,
    },

    #[error("Response from {path} carried no data")]
    EmptyResponse { path: String },

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Entry {id} already has an action in flight")]
    ActionInFlight { id: String },

    #[error("Entry {id} is not in the pending list")]
    UnknownEntry { id: String },

    #[error("Submission failed: {message}")]
    SubmissionFailed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Server,
    Configuration,
    Validation,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PriceBoardError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) => ErrorCategory::Network,
            Self::ApiStatus { .. } | Self::SubmissionFailed { .. } => ErrorCategory::Server,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::ValidationError { .. }
            | Self::ActionInFlight { .. }
            | Self::UnknownEntry { .. } => ErrorCategory::Validation,
            Self::SerializationError(_) | Self::CsvError(_) | Self::EmptyResponse { .. } => {
                ErrorCategory::Data
            }
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActionInFlight { .. } => ErrorSeverity::Low,
            Self::HttpError(_) | Self::SubmissionFailed { .. } => ErrorSeverity::Medium,
            Self::ApiStatus { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            Self::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// 給終端使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::HttpError(e) if e.is_timeout() => {
                "The price server did not answer in time".to_string()
            }
            Self::HttpError(_) => "Could not reach the price server".to_string(),
            Self::ApiStatus {
                server_message: Some(message),
                ..
            } => message.clone(),
            Self::ApiStatus { status, .. } => format!("Request failed with status {}", status),
            Self::ValidationError { message } | Self::SubmissionFailed { message } => {
                message.clone()
            }
            Self::ActionInFlight { id } => format!("Entry {} is already being processed", id),
            Self::UnknownEntry { id } => format!("Entry {} is not pending review", id),
            Self::MissingConfigError { field } => format!("Missing setting: {}", field),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the API URL is correct and the server is running",
            ErrorCategory::Server => "Retry the command; if it keeps failing, check the server logs",
            ErrorCategory::Configuration => "Review the CLI flags and the TOML config file",
            ErrorCategory::Validation => "Fix the highlighted values and try again",
            ErrorCategory::Data => "The server response could not be read; check the API version",
            ErrorCategory::System => "Check file permissions for the data directory",
        }
    }
}

pub type Result<T> = std::result::Result<T, PriceBoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        let err = PriceBoardError::ApiStatus {
            status: 503,
            server_message: None,
        };
        assert_eq!(err.category(), ErrorCategory::Server);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.user_friendly_message(), "Request failed with status 503");

        let err = PriceBoardError::ApiStatus {
            status: 404,
            server_message: Some("Entry not found".to_string()),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.user_friendly_message(), "Entry not found");
        assert_eq!(err.to_string(), "API returned 404: Entry not found");
    }

    #[test]
    fn test_validation_message_passthrough() {
        let err = PriceBoardError::validation("Name is required");
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.user_friendly_message(), "Name is required");
        assert_eq!(err.to_string(), "Validation error: Name is required");
    }
}
