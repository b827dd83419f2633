use thiserror::Error;

/// Coarse error category used for control flow and display grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was rejected before any I/O happened
    InvalidRequest,
    /// Transport, connectivity or HTTP status failure
    NetworkError,
    /// The server answered without a usable body
    EmptyResponse,
    /// The payload did not match the expected shape
    DecodeError,
}

/// Errors that can occur while talking to a recipe source
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Malformed input or URL, detected before sending anything
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to reach the recipe API
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The recipe API answered with a non-success status
    #[error("Recipe API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response carried no body, or no recipe where one was expected
    #[error("No data received")]
    EmptyResponse,

    /// Failed to decode the JSON payload
    #[error("Decoding error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Failed to read or parse the bundled recipe file
    #[error("Local recipe data error: {0}")]
    LocalData(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl RecipeError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecipeError::InvalidRequest(_)
            | RecipeError::LocalData(_)
            | RecipeError::Config(_) => ErrorKind::InvalidRequest,
            RecipeError::Network(_) | RecipeError::HttpStatus { .. } => ErrorKind::NetworkError,
            RecipeError::EmptyResponse => ErrorKind::EmptyResponse,
            RecipeError::Decode(_) => ErrorKind::DecodeError,
        }
    }
}
