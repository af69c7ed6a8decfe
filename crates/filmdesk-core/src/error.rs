/// Core error types for filmdesk.
#[derive(Debug, thiserror::Error)]
pub enum FilmdeskError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Client-side checks that block a request before it is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Release year must be a number, got {0:?}")]
    InvalidYear(String),

    #[error("Release year must be between {min} and {max}, got {year}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    #[error("Cast must list at least one name")]
    EmptyCast,

    #[error("Username and password are required")]
    MissingCredentials,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; `message` follows the server-or-fallback extraction policy.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Unauthorized")]
    Unauthorized,

    /// 2xx response that lacks the fields the caller needs.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to read session: {0}")]
    Read(String),

    #[error("Failed to write session: {0}")]
    Write(String),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl FilmdeskError {
    /// True when the failure came from a 401 and the session was torn down.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FilmdeskError::Api(ApiError::Unauthorized))
    }
}

pub type Result<T> = std::result::Result<T, FilmdeskError>;
