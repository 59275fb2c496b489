/*!
 * Database entity models.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data. Segment invariants (time order,
 * confidence range) are enforced at construction so an invalid record
 * never reaches the persistence layer.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classifier::ErrorClassification;

/// Transcription job status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job created, not yet started
    Pending,
    /// Provider attempts in flight
    Running,
    /// Authoritative segment set persisted
    Reconciled,
    /// Unrecoverable error occurred
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Reconciled => write!(f, "reconciled"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "reconciled" => Ok(JobStatus::Reconciled),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Transcription job record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job identifier (UUID)
    pub id: String,
    /// Path to the source media
    pub media_path: String,
    /// SHA256 hash of the source media for job dedup
    pub media_hash: String,
    /// Source language code
    pub source_language: String,
    /// Current job status
    pub status: JobStatus,
    /// Whether the source transcript has been confirmed for translation
    pub source_confirmed: bool,
    /// Failure classification code, if failed
    pub error_code: Option<String>,
    /// Failure message for UI display, if failed
    pub error_message: Option<String>,
    /// Whether the failure may be retried, if failed
    pub error_retryable: Option<bool>,
    /// Dubbing voice for this job; carried on the record, never global state
    pub voice_id: Option<String>,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Last update timestamp (ISO 8601)
    pub updated_at: String,
    /// Completion timestamp (ISO 8601), if finished
    pub completed_at: Option<String>,
}

impl JobRecord {
    /// Create a new pending job record
    pub fn new(
        id: String,
        media_path: String,
        media_hash: String,
        source_language: String,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            media_path,
            media_hash,
            source_language,
            status: JobStatus::Pending,
            source_confirmed: false,
            error_code: None,
            error_message: None,
            error_retryable: None,
            voice_id: None,
            created_at: now.clone(),
            updated_at: now,
            completed_at: None,
        }
    }

    /// Whether a failed job may be manually retried
    pub fn is_retryable(&self) -> bool {
        self.status == JobStatus::Failed && self.error_retryable.unwrap_or(false)
    }

    /// Attach a failure classification to the record
    pub fn with_failure(mut self, classification: &ErrorClassification) -> Self {
        self.status = JobStatus::Failed;
        self.error_code = Some(classification.code.to_string());
        self.error_message = Some(classification.message.clone());
        self.error_retryable = Some(classification.retryable);
        self
    }
}

/// Reconciled transcript segment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Database ID
    pub id: i64,
    /// Job this segment belongs to
    pub job_id: String,
    /// Position in the transcript, time-ordered
    pub seq_num: i64,
    /// Authoritative segment text
    pub text: String,
    /// Start time in milliseconds
    pub start_time_ms: i64,
    /// End time in milliseconds
    pub end_time_ms: i64,
    /// Derived confidence in [0, 1]
    pub confidence: f64,
    /// Provider that produced the authoritative text
    pub provider: String,
    /// Alternative text from a second provider, if one aligned
    pub alternative_text: Option<String>,
    /// Provider of the alternative text
    pub alternative_provider: Option<String>,
    /// Whether the alternative is currently the displayed text
    pub is_alternative_selected: bool,
    /// Speaker identifier, if the provider diarizes
    pub speaker_id: Option<String>,
    /// Human-assigned speaker name
    pub speaker_name: Option<String>,
}

impl SegmentRecord {
    /// Create a validated segment record (without database ID).
    ///
    /// Enforces the segment invariants: a positive time span, confidence in
    /// [0, 1] and non-empty text.
    pub fn new_validated(
        job_id: String,
        seq_num: i64,
        text: String,
        start_time_ms: i64,
        end_time_ms: i64,
        confidence: f64,
        provider: String,
    ) -> anyhow::Result<Self> {
        if end_time_ms <= start_time_ms {
            return Err(anyhow::anyhow!(
                "Invalid time range: end time {} <= start time {}",
                end_time_ms,
                start_time_ms
            ));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(anyhow::anyhow!(
                "Confidence {} outside [0, 1] for segment {}",
                confidence,
                seq_num
            ));
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(anyhow::anyhow!("Empty segment text for segment {}", seq_num));
        }

        Ok(Self {
            id: 0, // Will be assigned by database
            job_id,
            seq_num,
            text: trimmed.to_string(),
            start_time_ms,
            end_time_ms,
            confidence,
            provider,
            alternative_text: None,
            alternative_provider: None,
            is_alternative_selected: false,
            speaker_id: None,
            speaker_name: None,
        })
    }

    /// Attach an alternative transcript to the record
    pub fn with_alternative(mut self, text: String, provider: String) -> Self {
        self.alternative_text = Some(text);
        self.alternative_provider = Some(provider);
        self
    }

    /// Attach speaker information to the record
    pub fn with_speaker(mut self, speaker_id: Option<String>) -> Self {
        self.speaker_id = speaker_id;
        self
    }

    /// Segment display duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        (self.end_time_ms - self.start_time_ms).max(0) as u64
    }
}

/// Stored translation of one segment into one target language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Database ID
    pub id: i64,
    /// Segment this translation belongs to
    pub segment_id: i64,
    /// Target language code
    pub target_language: String,
    /// Translated text
    pub text: String,
    /// Derived confidence in [0, 1]
    pub confidence: f64,
    /// Provider that produced the translation
    pub provider: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl TranslationRecord {
    /// Create a new translation record (without database ID)
    pub fn new(
        segment_id: i64,
        target_language: String,
        text: String,
        confidence: f64,
        provider: String,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: 0, // Will be assigned by database
            segment_id,
            target_language,
            text,
            confidence: confidence.clamp(0.0, 1.0),
            provider,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use rand::Rng;

    #[test]
    fn test_jobStatus_display_shouldReturnSnakeCase() {
        assert_eq!(JobStatus::Pending.to_string(), "pending");
        assert_eq!(JobStatus::Running.to_string(), "running");
        assert_eq!(JobStatus::Reconciled.to_string(), "reconciled");
        assert_eq!(JobStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_jobStatus_fromStr_shouldParseValidStrings() {
        assert_eq!("pending".parse::<JobStatus>().unwrap(), JobStatus::Pending);
        assert_eq!(
            "reconciled".parse::<JobStatus>().unwrap(),
            JobStatus::Reconciled
        );
        assert!("bogus".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_jobRecord_withFailure_shouldCarryClassification() {
        let classification = classify("HTTP 429 Too Many Requests");
        let job = JobRecord::new(
            "job-1".to_string(),
            "/media/input.mp4".to_string(),
            "hash".to_string(),
            "bn".to_string(),
        )
        .with_failure(&classification);

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_code.as_deref(), Some("API_QUOTA_EXCEEDED"));
        assert!(job.is_retryable());
    }

    #[test]
    fn test_jobRecord_withFatalFailure_shouldNotBeRetryable() {
        let classification = classify("unsupported codec in container");
        let job = JobRecord::new(
            "job-1".to_string(),
            "/media/input.mp4".to_string(),
            "hash".to_string(),
            "bn".to_string(),
        )
        .with_failure(&classification);

        assert!(!job.is_retryable());
    }

    #[test]
    fn test_segmentRecord_newValidated_shouldRejectInvertedTimes() {
        let result = SegmentRecord::new_validated(
            "job-1".to_string(),
            1,
            "Hello".to_string(),
            2_000,
            1_000,
            0.9,
            "whisper".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_segmentRecord_newValidated_shouldRejectOutOfRangeConfidence() {
        let result = SegmentRecord::new_validated(
            "job-1".to_string(),
            1,
            "Hello".to_string(),
            0,
            1_000,
            1.2,
            "whisper".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_segmentRecord_newValidated_withRandomValidInput_shouldHoldInvariants() {
        let mut rng = rand::rng();

        for seq in 0..200 {
            let start: i64 = rng.random_range(0..1_000_000);
            let duration: i64 = rng.random_range(1..10_000);
            let confidence: f64 = rng.random_range(0.0..=1.0);

            let segment = SegmentRecord::new_validated(
                "job-1".to_string(),
                seq,
                "some words".to_string(),
                start,
                start + duration,
                confidence,
                "whisper".to_string(),
            )
            .expect("valid input must construct");

            assert!(segment.end_time_ms > segment.start_time_ms);
            assert!((0.0..=1.0).contains(&segment.confidence));
        }
    }

    #[test]
    fn test_translationRecord_new_shouldClampConfidence() {
        let record = TranslationRecord::new(
            1,
            "en".to_string(),
            "Hello".to_string(),
            1.7,
            "anthropic".to_string(),
        );
        assert_eq!(record.confidence, 1.0);
    }
}
