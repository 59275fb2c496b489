/*!
 * Integration tests for multi-provider reconciliation and its persistence.
 */

use std::sync::Arc;

use bytes::Bytes;

use dubflow::classifier::ErrorCode;
use dubflow::confidence::ConfidenceScorer;
use dubflow::database::models::{JobRecord, SegmentRecord};
use dubflow::database::Repository;
use dubflow::providers::mock::MockSpeechToText;
use dubflow::providers::AudioInput;
use dubflow::reconciler::TranscriptionReconciler;
use dubflow::standards::SubtitleStandards;

use crate::common;

fn audio() -> AudioInput {
    AudioInput::wav(Bytes::from_static(b"RIFF-test")).unwrap()
}

#[tokio::test]
async fn test_reconciledSegments_shouldPersistInTimeOrderWithAlternatives() {
    common::init_logging();

    let primary_segments = vec![
        ("প্রথম বাক্য।", 0u64, 2_000u64, 0.95),
        ("দ্বিতীয় বাক্য।", 2_500, 5_000, 0.90),
    ];
    let secondary_segments = vec![
        ("প্রথম বাক্যটি।", 100, 1_900, 0.85),
        ("দ্বিতীয় বাক্যটি।", 2_600, 4_900, 0.80),
    ];

    let reconciler = TranscriptionReconciler::new(vec![
        Arc::new(MockSpeechToText::working("whisper", &primary_segments)),
        Arc::new(MockSpeechToText::working("deepgram", &secondary_segments)),
    ]);
    let outcome = reconciler.reconcile(&audio()).await.unwrap();

    // Persist the outcome the way the pipeline does: validate, score, insert
    let repository = Repository::new_in_memory().unwrap();
    let job = JobRecord::new(
        "job-rec".to_string(),
        "/media/input.mp4".to_string(),
        "hash".to_string(),
        "bn".to_string(),
    );
    repository.create_job(&job).await.unwrap();

    let standards = SubtitleStandards::new();
    let scorer = ConfidenceScorer::new();
    let mut records = Vec::new();
    for (seq, segment) in outcome.segments.iter().enumerate() {
        let report = standards.validate(&segment.text, segment.start_time_ms, segment.end_time_ms);
        let confidence = scorer.score(
            segment.raw_confidence,
            &segment.provider,
            report.quality_score,
            segment.text.chars().count(),
            segment.end_time_ms - segment.start_time_ms,
        );
        let mut record = SegmentRecord::new_validated(
            job.id.clone(),
            seq as i64,
            segment.text.clone(),
            segment.start_time_ms as i64,
            segment.end_time_ms as i64,
            confidence,
            segment.provider.clone(),
        )
        .unwrap();
        if let (Some(text), Some(provider)) =
            (&segment.alternative_text, &segment.alternative_provider)
        {
            record = record.with_alternative(text.clone(), provider.clone());
        }
        records.push(record);
    }
    repository.insert_segments(records).await.unwrap();

    let stored = repository.get_segments("job-rec").await.unwrap();
    assert_eq!(stored.len(), 2);
    for pair in stored.windows(2) {
        assert!(pair[0].start_time_ms <= pair[1].start_time_ms);
    }
    for segment in &stored {
        assert!(segment.end_time_ms > segment.start_time_ms);
        assert!((0.0..=1.0).contains(&segment.confidence));
        assert_eq!(segment.provider, "whisper");
        assert_eq!(segment.alternative_provider.as_deref(), Some("deepgram"));
        assert!(segment.alternative_text.is_some());
    }
}

#[test]
fn test_reconcile_withEmptyProviderChain_shouldFail() {
    let reconciler = TranscriptionReconciler::new(vec![]);

    let error = tokio_test::block_on(reconciler.reconcile(&audio()))
        .err()
        .unwrap();

    assert!(error.failures.is_empty());
    assert_eq!(error.last_classification().code, ErrorCode::UnknownError);
}

#[tokio::test]
async fn test_quotaFailure_shouldFallBackAndStillPersist() {
    common::init_logging();

    let segments = vec![("একটি বাক্য।", 0u64, 2_000u64, 0.9)];
    let primary = Arc::new(MockSpeechToText::rate_limited("whisper"));
    let secondary = Arc::new(MockSpeechToText::working("deepgram", &segments));

    let reconciler = TranscriptionReconciler::new(vec![primary.clone(), secondary.clone()]);
    let outcome = reconciler.reconcile(&audio()).await.unwrap();

    assert_eq!(secondary.request_count(), 1);
    assert_eq!(outcome.provider, "deepgram");
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].classification.retryable);
}
