//! Error types for the tumblr-downloader application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // API errors
    #[error("API error: {0}")]
    Api(String),

    /// The short-link lookup answered with something that is neither the
    /// "Not Found" marker nor the expected JSON document.
    #[error("Malformed resolver response for '{slug}': {body}")]
    MalformedResolverResponse { slug: String, body: String },

    // Data errors
    #[error("Invalid post identifier: '{0}'")]
    InvalidPostId(String),

    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // Pipeline errors
    #[error("Download queue closed for {0}")]
    QueueClosed(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const INTERRUPTED: i32 = 1;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}
