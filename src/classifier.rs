/*!
 * Failure classification for provider and pipeline errors.
 *
 * Every failure that reaches a job boundary is mapped into a closed taxonomy
 * with a retryability flag. The reconciler and batch engine use the flag to
 * decide between provider fallback and terminal job failure, and the message
 * is what the end user sees on a failed job.
 */

use std::fmt;

use crate::errors::{MediaError, ProviderError};

/// Closed error taxonomy for failed jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Persistence layer rejected a write
    DatabaseConstraint,
    /// Provider rate limit or quota was hit
    ApiQuotaExceeded,
    /// Media codec or container cannot be processed
    UnsupportedFormat,
    /// Source media is missing
    FileNotFound,
    /// Connection or timeout failure
    NetworkError,
    /// Anything not matched above
    UnknownError,
}

impl ErrorCode {
    /// Whether a job carrying this code may be retried automatically.
    ///
    /// Format and missing-file errors require user action; everything else is
    /// treated as transient so a one-off failure is never permanently fatal.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnsupportedFormat | Self::FileNotFound)
    }

    /// Whether this code should advance a fallback chain to the next provider
    pub fn triggers_fallback(&self) -> bool {
        matches!(self, Self::ApiQuotaExceeded | Self::NetworkError | Self::UnknownError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DatabaseConstraint => write!(f, "DATABASE_CONSTRAINT"),
            Self::ApiQuotaExceeded => write!(f, "API_QUOTA_EXCEEDED"),
            Self::UnsupportedFormat => write!(f, "UNSUPPORTED_FORMAT"),
            Self::FileNotFound => write!(f, "FILE_NOT_FOUND"),
            Self::NetworkError => write!(f, "NETWORK_ERROR"),
            Self::UnknownError => write!(f, "UNKNOWN_ERROR"),
        }
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DATABASE_CONSTRAINT" => Ok(Self::DatabaseConstraint),
            "API_QUOTA_EXCEEDED" => Ok(Self::ApiQuotaExceeded),
            "UNSUPPORTED_FORMAT" => Ok(Self::UnsupportedFormat),
            "FILE_NOT_FOUND" => Ok(Self::FileNotFound),
            "NETWORK_ERROR" => Ok(Self::NetworkError),
            "UNKNOWN_ERROR" => Ok(Self::UnknownError),
            _ => Err(anyhow::anyhow!("Invalid error code: {}", s)),
        }
    }
}

/// Classified failure attached to a job
#[derive(Debug, Clone)]
pub struct ErrorClassification {
    /// Taxonomy code
    pub code: ErrorCode,
    /// Human-readable message for the end user
    pub message: String,
    /// Whether the job may be retried
    pub retryable: bool,
}

impl ErrorClassification {
    fn new(code: ErrorCode, message: String) -> Self {
        Self {
            retryable: code.is_retryable(),
            code,
            message,
        }
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Classify a raw error message into the closed taxonomy.
///
/// Patterns are checked in priority order; the first match wins, so a message
/// mentioning both a quota and a connection problem classifies as quota.
pub fn classify(raw: &str) -> ErrorClassification {
    let lowered = raw.to_lowercase();

    if lowered.contains("constraint")
        || lowered.contains("not null")
        || lowered.contains("not-null")
        || lowered.contains("unique violation")
    {
        return ErrorClassification::new(
            ErrorCode::DatabaseConstraint,
            format!("A database write was rejected and will be retried: {}", raw),
        );
    }

    if lowered.contains("429")
        || lowered.contains("quota")
        || lowered.contains("rate limit")
        || lowered.contains("too many requests")
    {
        return ErrorClassification::new(
            ErrorCode::ApiQuotaExceeded,
            "The provider's request quota was exceeded; trying the next provider".to_string(),
        );
    }

    if lowered.contains("unsupported format")
        || lowered.contains("unsupported media")
        || lowered.contains("codec")
        || lowered.contains("invalid data found")
    {
        return ErrorClassification::new(
            ErrorCode::UnsupportedFormat,
            "The media format is not supported; please re-encode the file and try again".to_string(),
        );
    }

    if lowered.contains("no such file")
        || lowered.contains("file not found")
        || lowered.contains("enoent")
        || lowered.contains("not found")
    {
        return ErrorClassification::new(
            ErrorCode::FileNotFound,
            "The source media file could not be found".to_string(),
        );
    }

    if lowered.contains("connection")
        || lowered.contains("timed out")
        || lowered.contains("timeout")
        || lowered.contains("network")
        || lowered.contains("dns")
    {
        return ErrorClassification::new(
            ErrorCode::NetworkError,
            format!("A network problem interrupted the request: {}", raw),
        );
    }

    ErrorClassification::new(
        ErrorCode::UnknownError,
        format!("An unexpected error occurred: {}", raw),
    )
}

/// Classify a structured provider error.
///
/// Structured variants short-circuit the text matching where the intent is
/// unambiguous; everything else falls through to [`classify`] on the message.
pub fn classify_provider_error(error: &ProviderError) -> ErrorClassification {
    match error {
        ProviderError::RateLimitExceeded(msg) => ErrorClassification::new(
            ErrorCode::ApiQuotaExceeded,
            format!("The provider's request quota was exceeded: {}", msg),
        ),
        ProviderError::ConnectionError(msg) => ErrorClassification::new(
            ErrorCode::NetworkError,
            format!("A network problem interrupted the request: {}", msg),
        ),
        ProviderError::ApiError { status_code: 429, message } => ErrorClassification::new(
            ErrorCode::ApiQuotaExceeded,
            format!("The provider's request quota was exceeded: {}", message),
        ),
        other => classify(&other.to_string()),
    }
}

/// Classify a media extraction error
pub fn classify_media_error(error: &MediaError) -> ErrorClassification {
    match error {
        MediaError::FileNotFound(path) => ErrorClassification::new(
            ErrorCode::FileNotFound,
            format!("The source media file could not be found: {}", path.display()),
        ),
        MediaError::UnsupportedFormat(msg) => ErrorClassification::new(
            ErrorCode::UnsupportedFormat,
            format!("The media format is not supported; please re-encode the file: {}", msg),
        ),
        MediaError::ExtractionFailed(msg) => classify(msg),
    }
}
