/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 * Translation writes use upsert semantics keyed on
 * (segment_id, target_language) so concurrent retries never duplicate rows.
 */

use anyhow::{anyhow, Result};
use log::debug;
use rusqlite::{params, OptionalExtension, Row};

use crate::classifier::ErrorClassification;

use super::connection::DatabaseConnection;
use super::models::{JobRecord, JobStatus, SegmentRecord, TranslationRecord};

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Access the underlying connection (for stats)
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Job Operations
    // =========================================================================

    /// Create a new transcription job
    pub async fn create_job(&self, job: &JobRecord) -> Result<()> {
        let job = job.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO jobs (
                        id, media_path, media_hash, source_language, status, source_confirmed,
                        error_code, error_message, error_retryable, voice_id,
                        created_at, updated_at, completed_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                    "#,
                    params![
                        job.id,
                        job.media_path,
                        job.media_hash,
                        job.source_language,
                        job.status.to_string(),
                        job.source_confirmed,
                        job.error_code,
                        job.error_message,
                        job.error_retryable,
                        job.voice_id,
                        job.created_at,
                        job.updated_at,
                        job.completed_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Get a job by ID
    pub async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let job_id = job_id.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        &format!("{} WHERE id = ?1", JOB_SELECT),
                        [job_id],
                        job_from_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Find the most recent job for a media hash, for resume-instead-of-duplicate
    pub async fn find_job_by_media_hash(&self, media_hash: &str) -> Result<Option<JobRecord>> {
        let media_hash = media_hash.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        &format!(
                            "{} WHERE media_hash = ?1 ORDER BY updated_at DESC LIMIT 1",
                            JOB_SELECT
                        ),
                        [media_hash],
                        job_from_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Update the status of a job
    pub async fn update_job_status(&self, job_id: &str, status: JobStatus) -> Result<()> {
        let job_id = job_id.to_string();
        let completed = matches!(status, JobStatus::Reconciled | JobStatus::Failed);

        self.db
            .execute_async(move |conn| {
                let updated = if completed {
                    conn.execute(
                        "UPDATE jobs SET status = ?1, updated_at = datetime('now'),
                         completed_at = datetime('now') WHERE id = ?2",
                        params![status.to_string(), job_id],
                    )?
                } else {
                    conn.execute(
                        "UPDATE jobs SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
                        params![status.to_string(), job_id],
                    )?
                };
                if updated == 0 {
                    return Err(anyhow!("No job with id {}", job_id));
                }
                Ok(())
            })
            .await
    }

    /// Mark a job failed with its error classification
    pub async fn mark_job_failed(
        &self,
        job_id: &str,
        classification: &ErrorClassification,
    ) -> Result<()> {
        let job_id = job_id.to_string();
        let code = classification.code.to_string();
        let message = classification.message.clone();
        let retryable = classification.retryable;

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "UPDATE jobs SET status = 'failed', error_code = ?1, error_message = ?2,
                     error_retryable = ?3, updated_at = datetime('now'),
                     completed_at = datetime('now') WHERE id = ?4",
                    params![code, message, retryable, job_id],
                )?;
                Ok(())
            })
            .await
    }

    /// Reset a failed job so the failed stage can be re-run.
    ///
    /// Any segments a partially completed run left behind are removed so the
    /// rerun starts from a clean slate.
    pub async fn reset_job_for_retry(&self, job_id: &str) -> Result<()> {
        let job_id = job_id.to_string();

        self.db
            .transaction_async(move |tx| {
                tx.execute("DELETE FROM segments WHERE job_id = ?1", [&job_id])?;
                tx.execute(
                    "UPDATE jobs SET status = 'pending', error_code = NULL, error_message = NULL,
                     error_retryable = NULL, completed_at = NULL, updated_at = datetime('now')
                     WHERE id = ?1",
                    [&job_id],
                )?;
                Ok(())
            })
            .await
    }

    /// Mark the source transcript of a job as confirmed for translation
    pub async fn confirm_source(&self, job_id: &str) -> Result<()> {
        let job_id = job_id.to_string();

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE jobs SET source_confirmed = 1, updated_at = datetime('now') WHERE id = ?1",
                    [&job_id],
                )?;
                if updated == 0 {
                    return Err(anyhow!("No job with id {}", job_id));
                }
                Ok(())
            })
            .await
    }

    /// Set the dubbing voice for a job
    pub async fn set_voice_id(&self, job_id: &str, voice_id: &str) -> Result<()> {
        let job_id = job_id.to_string();
        let voice_id = voice_id.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "UPDATE jobs SET voice_id = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![voice_id, job_id],
                )?;
                Ok(())
            })
            .await
    }

    // =========================================================================
    // Segment Operations
    // =========================================================================

    /// Insert reconciled segments for a job in one transaction, in time order
    pub async fn insert_segments(&self, segments: Vec<SegmentRecord>) -> Result<usize> {
        self.db
            .transaction_async(move |tx| {
                let mut inserted = 0;
                for segment in &segments {
                    tx.execute(
                        r#"
                        INSERT INTO segments (
                            job_id, seq_num, text, start_time_ms, end_time_ms, confidence,
                            provider, alternative_text, alternative_provider,
                            is_alternative_selected, speaker_id, speaker_name
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                        "#,
                        params![
                            segment.job_id,
                            segment.seq_num,
                            segment.text,
                            segment.start_time_ms,
                            segment.end_time_ms,
                            segment.confidence,
                            segment.provider,
                            segment.alternative_text,
                            segment.alternative_provider,
                            segment.is_alternative_selected,
                            segment.speaker_id,
                            segment.speaker_name,
                        ],
                    )?;
                    inserted += 1;
                }
                debug!("Inserted {} segments", inserted);
                Ok(inserted)
            })
            .await
    }

    /// Get all segments of a job in transcript order
    pub async fn get_segments(&self, job_id: &str) -> Result<Vec<SegmentRecord>> {
        let job_id = job_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut statement = conn.prepare(&format!(
                    "{} WHERE job_id = ?1 ORDER BY seq_num",
                    SEGMENT_SELECT
                ))?;
                let segments = statement
                    .query_map([job_id], segment_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(segments)
            })
            .await
    }

    /// Get a segment by ID
    pub async fn get_segment(&self, segment_id: i64) -> Result<Option<SegmentRecord>> {
        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        &format!("{} WHERE id = ?1", SEGMENT_SELECT),
                        [segment_id],
                        segment_from_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Overwrite the text of a segment (user edit)
    pub async fn update_segment_text(&self, segment_id: i64, text: &str) -> Result<()> {
        let text = text.to_string();

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE segments SET text = ?1 WHERE id = ?2",
                    params![text, segment_id],
                )?;
                if updated == 0 {
                    return Err(anyhow!("No segment with id {}", segment_id));
                }
                Ok(())
            })
            .await
    }

    /// Swap a segment's text with its alternative transcript.
    ///
    /// The swap is done in SQL so the pair stays consistent under concurrent
    /// access. The swapped text is not re-validated against subtitle
    /// standards; the alternative was scored when it was attached.
    pub async fn switch_alternative(&self, segment_id: i64) -> Result<SegmentRecord> {
        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    r#"
                    UPDATE segments SET
                        text = alternative_text,
                        alternative_text = text,
                        provider = alternative_provider,
                        alternative_provider = provider,
                        is_alternative_selected = NOT is_alternative_selected
                    WHERE id = ?1 AND alternative_text IS NOT NULL
                    "#,
                    [segment_id],
                )?;
                if updated == 0 {
                    return Err(anyhow!(
                        "Segment {} does not exist or has no alternative transcript",
                        segment_id
                    ));
                }

                conn.query_row(
                    &format!("{} WHERE id = ?1", SEGMENT_SELECT),
                    [segment_id],
                    segment_from_row,
                )
                .map_err(Into::into)
            })
            .await
    }

    /// Delete a segment (explicit user action); translations cascade
    pub async fn delete_segment(&self, segment_id: i64) -> Result<()> {
        self.db
            .execute_async(move |conn| {
                conn.execute("DELETE FROM segments WHERE id = ?1", [segment_id])?;
                Ok(())
            })
            .await
    }

    // =========================================================================
    // Translation Operations
    // =========================================================================

    /// Insert or update a translation keyed by (segment_id, target_language)
    pub async fn upsert_translation(&self, record: &TranslationRecord) -> Result<()> {
        let record = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translations (
                        segment_id, target_language, text, confidence, provider,
                        created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(segment_id, target_language) DO UPDATE SET
                        text = excluded.text,
                        confidence = excluded.confidence,
                        provider = excluded.provider,
                        updated_at = excluded.updated_at
                    "#,
                    params![
                        record.segment_id,
                        record.target_language,
                        record.text,
                        record.confidence,
                        record.provider,
                        record.created_at,
                        record.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Get all translations of a job for one language, in transcript order
    pub async fn get_translations(
        &self,
        job_id: &str,
        target_language: &str,
    ) -> Result<Vec<TranslationRecord>> {
        let job_id = job_id.to_string();
        let target_language = target_language.to_string();

        self.db
            .execute_async(move |conn| {
                let mut statement = conn.prepare(
                    r#"
                    SELECT t.id, t.segment_id, t.target_language, t.text, t.confidence,
                           t.provider, t.created_at, t.updated_at
                    FROM translations t
                    JOIN segments s ON s.id = t.segment_id
                    WHERE s.job_id = ?1 AND t.target_language = ?2
                    ORDER BY s.seq_num
                    "#,
                )?;
                let translations = statement
                    .query_map(params![job_id, target_language], translation_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(translations)
            })
            .await
    }

    /// Count stored translations of a job for one language
    pub async fn count_translations(&self, job_id: &str, target_language: &str) -> Result<i64> {
        let job_id = job_id.to_string();
        let target_language = target_language.to_string();

        self.db
            .execute_async(move |conn| {
                let count: i64 = conn.query_row(
                    r#"
                    SELECT COUNT(*) FROM translations t
                    JOIN segments s ON s.id = t.segment_id
                    WHERE s.job_id = ?1 AND t.target_language = ?2
                    "#,
                    params![job_id, target_language],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
    }
}

const JOB_SELECT: &str = "SELECT id, media_path, media_hash, source_language, status, \
                          source_confirmed, error_code, error_message, error_retryable, \
                          voice_id, created_at, updated_at, completed_at FROM jobs";

const SEGMENT_SELECT: &str = "SELECT id, job_id, seq_num, text, start_time_ms, end_time_ms, \
                              confidence, provider, alternative_text, alternative_provider, \
                              is_alternative_selected, speaker_id, speaker_name FROM segments";

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        id: row.get(0)?,
        media_path: row.get(1)?,
        media_hash: row.get(2)?,
        source_language: row.get(3)?,
        status: row
            .get::<_, String>(4)?
            .parse()
            .unwrap_or(JobStatus::Pending),
        source_confirmed: row.get(5)?,
        error_code: row.get(6)?,
        error_message: row.get(7)?,
        error_retryable: row.get(8)?,
        voice_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        completed_at: row.get(12)?,
    })
}

fn segment_from_row(row: &Row<'_>) -> rusqlite::Result<SegmentRecord> {
    Ok(SegmentRecord {
        id: row.get(0)?,
        job_id: row.get(1)?,
        seq_num: row.get(2)?,
        text: row.get(3)?,
        start_time_ms: row.get(4)?,
        end_time_ms: row.get(5)?,
        confidence: row.get(6)?,
        provider: row.get(7)?,
        alternative_text: row.get(8)?,
        alternative_provider: row.get(9)?,
        is_alternative_selected: row.get(10)?,
        speaker_id: row.get(11)?,
        speaker_name: row.get(12)?,
    })
}

fn translation_from_row(row: &Row<'_>) -> rusqlite::Result<TranslationRecord> {
    Ok(TranslationRecord {
        id: row.get(0)?,
        segment_id: row.get(1)?,
        target_language: row.get(2)?,
        text: row.get(3)?,
        confidence: row.get(4)?,
        provider: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
