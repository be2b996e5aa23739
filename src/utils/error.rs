use thiserror::Error;

#[derive(Error, Debug)]
pub enum PokedexError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Recognition provider returned HTTP {status} during {context}")]
    ProviderError { status: u16, context: String },

    #[error("Malformed model response: {reason}")]
    MalformedResponseError { reason: String },

    #[error("No valid identification after {attempts} attempts")]
    AttemptsExhaustedError { attempts: u32 },

    #[error("Invalid picture: {reason}")]
    InvalidPictureError { reason: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid config value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

impl PokedexError {
    /// Short message suitable for stderr, without internal detail.
    pub fn user_friendly_message(&self) -> String {
        match self {
            PokedexError::MissingConfigError { field } => {
                format!("Missing required configuration: {}", field)
            }
            PokedexError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration problem with {}: {}", field, reason)
            }
            PokedexError::ConfigValidationError { field, message } => {
                format!("Configuration problem with {}: {}", field, message)
            }
            PokedexError::IoError(e) => format!("File system problem: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PokedexError::MissingConfigError { .. } => {
                "Set GEMINI_API_KEY or pass --config with a [recognition] api_key entry"
            }
            PokedexError::InvalidConfigValueError { .. }
            | PokedexError::ConfigValidationError { .. } => {
                "Check the values in your configuration file"
            }
            PokedexError::IoError(_) => "Check that the configuration path exists and is readable",
            PokedexError::ApiError(_) | PokedexError::ProviderError { .. } => {
                "Check network connectivity and the recognition endpoint"
            }
            _ => "Re-run with --verbose for details",
        }
    }
}

pub type Result<T> = std::result::Result<T, PokedexError>;
