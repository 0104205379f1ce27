use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContactError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Failed to fetch contacts: {message}")]
    Fetch { message: String },

    #[error("Invalid age for {contact}: {reason}")]
    InvalidAge { contact: String, reason: String },

    #[error("Empty batch: {operation} needs at least one eligible contact")]
    EmptyBatch { operation: String },

    #[error("Failed to persist contacts: {message}")]
    Persist { message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error in {field}: {message}")]
    Config { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Store,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ContactError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ContactError::Auth { .. } => ErrorCategory::Authentication,
            ContactError::Fetch { .. } | ContactError::Persist { .. } | ContactError::Http(_) => {
                ErrorCategory::Store
            }
            ContactError::InvalidAge { .. } | ContactError::EmptyBatch { .. } => {
                ErrorCategory::Data
            }
            ContactError::Config { .. }
            | ContactError::InvalidConfigValue { .. }
            | ContactError::MissingConfig { .. } => ErrorCategory::Configuration,
            ContactError::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ContactError::Auth { .. }
            | ContactError::Fetch { .. }
            | ContactError::Persist { .. }
            | ContactError::Http(_) => ErrorSeverity::Medium,
            ContactError::InvalidAge { .. }
            | ContactError::EmptyBatch { .. }
            | ContactError::Config { .. }
            | ContactError::InvalidConfigValue { .. }
            | ContactError::MissingConfig { .. } => ErrorSeverity::High,
            ContactError::Io(_) => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the CLI. Never 0: every error means nothing was saved.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ContactError::Auth { .. } => {
                "Could not obtain an access token from the contacts API".to_string()
            }
            ContactError::Fetch { .. } => "Could not read contacts from the API".to_string(),
            ContactError::Persist { .. } => {
                "Contacts were transformed but could not be saved".to_string()
            }
            ContactError::InvalidAge { contact, .. } => {
                format!("Contact '{}' has an age that cannot be used", contact)
            }
            ContactError::EmptyBatch { operation } => {
                format!("No eligible contacts for '{}', nothing was saved", operation)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Authentication => {
                "Check the client id, client secret, subscription key and requestor"
            }
            ErrorCategory::Store => {
                "Check the API base URL and network connectivity, then rerun the operation"
            }
            ErrorCategory::Data => "Inspect the contact data returned by the API",
            ErrorCategory::Configuration => "Fix the configuration value and try again",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, ContactError>;
