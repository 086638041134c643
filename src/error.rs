//! Custom error types for ldhead

use thiserror::Error;

/// Main error type for ldhead operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid schema type: {0}")]
    InvalidSchemaType(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error(
        "Script tags are not allowed: paste only the JSON-LD body, without the surrounding <script> element"
    )]
    ScriptTagDetected,

    #[error("Schema not found: {0}")]
    NotFound(i64),

    #[error("Content item not found: {0}")]
    ItemNotFound(i64),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("No URLs provided")]
    NoUrls,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Machine-readable code reported by the REST channel
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidUrl(_) => "invalid_url",
            Error::InvalidSchemaType(_) => "invalid_type",
            Error::InvalidJson(_) => "invalid_json",
            Error::ScriptTagDetected => "script_tags",
            Error::NotFound(_) | Error::ItemNotFound(_) => "not_found",
            Error::PermissionDenied => "forbidden",
            Error::AuthenticationFailed(_) => "unauthorized",
            Error::NoUrls => "no_urls",
            Error::Database(_) => "db_error",
            _ => "internal_error",
        }
    }

    /// HTTP status code for the REST channel
    pub fn status(&self) -> u16 {
        match self {
            Error::InvalidUrl(_)
            | Error::InvalidSchemaType(_)
            | Error::InvalidJson(_)
            | Error::ScriptTagDetected
            | Error::NoUrls => 400,
            Error::AuthenticationFailed(_) => 401,
            Error::PermissionDenied => 403,
            Error::NotFound(_) | Error::ItemNotFound(_) => 404,
            _ => 500,
        }
    }

    /// Whether the error was caused by caller input rather than the system
    pub fn is_validation(&self) -> bool {
        self.status() == 400
    }
}

/// Result type alias for ldhead
pub type Result<T> = std::result::Result<T, Error>;
