//! Error types for the Shiori application.
//!
//! Uses `thiserror` for structured error definitions. None of these are
//! fatal to a crawl: callers convert them into empty results, skipped
//! chapters, or a user-facing message.

use thiserror::Error;

/// Failure of a single network retrieval.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Transport failure or non-success HTTP status
    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown url>".to_string());

        if err.is_timeout() {
            FetchError::Timeout(url)
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Failure to select or read elements from a parsed document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The selector string is not valid CSS
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// The selector matched nothing
    #[error("Element not found: {0}")]
    MissingElement(String),

    /// A matched element lacks the requested attribute
    #[error("Element '{selector}' has no '{attribute}' attribute")]
    MissingAttribute { selector: String, attribute: String },
}

/// Failure to turn a chapter page into chapter content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The chapter page could not be fetched
    #[error("Network failure: {0}")]
    Network(#[from] FetchError),

    /// The page was fetched but had an unexpected structure
    #[error("Malformed chapter page: {0}")]
    Malformed(String),

    /// A required element was absent or empty
    #[error("Missing element: {0}")]
    MissingElement(String),
}

impl From<ParseError> for ExtractionError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::MissingElement(what) => ExtractionError::MissingElement(what),
            other => ExtractionError::Malformed(other.to_string()),
        }
    }
}

/// Error type for site lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SiteError {
    /// The site id is not in the registry
    #[error("Site '{0}' is not supported")]
    UnknownSite(String),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Failure persisting a manuscript.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Filesystem failure while writing the output file
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Nothing to write
    #[error("Manuscript for '{0}' has no chapters")]
    EmptyManuscript(String),
}
