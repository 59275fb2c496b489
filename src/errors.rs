/*!
 * Error types for the dubflow application.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Input rejected before a request was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ProviderError {
    /// Map a reqwest transport error into a provider error
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::ConnectionError(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }

    /// Map a non-success HTTP status and body into a provider error
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            429 => Self::RateLimitExceeded(message),
            401 | 403 => Self::AuthenticationError(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors that can occur at the media extraction boundary
#[derive(Error, Debug)]
pub enum MediaError {
    /// Source media file is missing
    #[error("Media file not found: {0}")]
    FileNotFound(PathBuf),

    /// Codec or container format cannot be decoded
    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    /// Extraction tool failed for another reason
    #[error("Audio extraction failed: {0}")]
    ExtractionFailed(String),
}

/// Errors that can occur while driving the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Translation requested before the source transcript was confirmed
    #[error("Source transcript has not been confirmed; confirm it before translating")]
    NotConfirmed,

    /// Every provider in a fallback chain failed
    #[error("All providers failed: {reasons}")]
    AllProvidersFailed {
        /// Combined failure reasons, one per provider
        reasons: String
    },

    /// No job exists with the given identifier
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// No segment exists with the given identifier
    #[error("Segment not found: {0}")]
    SegmentNotFound(i64),

    /// A pipeline stage exceeded its time budget
    #[error("Stage '{stage}' timed out after {secs}s")]
    Timeout {
        /// Name of the stage that timed out
        stage: String,
        /// Budget in seconds
        secs: u64
    },

    /// A provider response failed to cover one or more requested segments
    #[error("Partial translation: {missing} of {total} segments were not covered by the response")]
    PartialTranslation {
        /// Segments left untranslated
        missing: usize,
        /// Segments requested
        total: usize
    },

    /// Job has no translations for the requested language
    #[error("No translations exist for job {job_id} in language '{language}'")]
    NoTranslations {
        /// Job identifier
        job_id: String,
        /// Requested target language
        language: String
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from media extraction
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Error from pipeline orchestration
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
