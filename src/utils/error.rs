use thiserror::Error;

#[derive(Error, Debug)]
pub enum UkpsError {
    #[error("Invalid domain: {input:?}")]
    InvalidDomain { input: String },

    #[error("Registry data not loaded, call refresh() first")]
    NotLoaded,

    #[error("Registry data unavailable (remote: {remote}; local: {local})")]
    DataUnavailable { remote: String, local: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid document {document}: {reason}")]
    InvalidDocument { document: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value:?}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid version string: {version:?}")]
    InvalidVersion { version: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Network,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UkpsError {
    pub fn invalid_domain(input: impl Into<String>) -> Self {
        Self::InvalidDomain {
            input: input.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDomain { .. } | Self::InvalidVersion { .. } => ErrorCategory::Input,
            Self::NotLoaded
            | Self::DataUnavailable { .. }
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::InvalidDocument { .. } => ErrorCategory::Data,
            Self::HttpError(_) | Self::HttpStatus { .. } => ErrorCategory::Network,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidDomain { .. } | Self::InvalidVersion { .. } => ErrorSeverity::Low,
            Self::HttpError(_) | Self::HttpStatus { .. } => ErrorSeverity::Medium,
            Self::NotLoaded
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::InvalidDocument { .. }
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::High,
            Self::DataUnavailable { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the domain or email address you supplied",
            ErrorCategory::Network => "Check network access to the remote data source, or disable remote loading",
            ErrorCategory::Data => match self {
                Self::NotLoaded => "Load the registry with refresh() before looking up domains",
                _ => "Make sure the local data directory contains valid user_domains.json and govuk_organisations.json",
            },
            ErrorCategory::Configuration => "Review the configuration file and command line flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidDomain { input } => format!("'{}' is not a valid domain or email", input),
            Self::NotLoaded => "The domain registry has not been loaded yet".to_string(),
            Self::DataUnavailable { .. } => {
                "Could not load domain data from either the remote or the local source".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UkpsError>;
