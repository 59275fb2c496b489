/*!
 * Integration tests for controller-level flows: re-translation, alternative
 * switching and dubbing.
 */

use std::sync::Arc;

use dubflow::database::Repository;
use dubflow::errors::{AppError, PipelineError};
use dubflow::providers::mock::{MockSynthesis, MockTranslator};
use dubflow::providers::TranslationModel;

use crate::common;

#[tokio::test]
async fn test_retranslate_shouldOverwriteExistingRow() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    let segments = common::seed_reconciled_job(&repository, "job-1", 3).await;

    let controller = common::controller_with(
        repository.clone(),
        vec![],
        vec![Arc::new(MockTranslator::working("anthropic"))],
    );

    controller.confirm_source("job-1").await.unwrap();
    controller.translate("job-1", "en").await.unwrap();

    let target = segments[1].id;
    let record = controller.retranslate(target, "en").await.unwrap();
    assert_eq!(record.segment_id, target);

    // Exactly one row per (segment, language) pair survives the rerun
    let count = repository.count_translations("job-1", "en").await.unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_retranslate_beforeConfirmation_shouldBeRejected() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    let segments = common::seed_reconciled_job(&repository, "job-1", 1).await;

    let controller = common::controller_with(
        repository,
        vec![],
        vec![Arc::new(MockTranslator::working("anthropic"))],
    );

    let error = controller
        .retranslate(segments[0].id, "en")
        .await
        .err()
        .unwrap();
    assert!(matches!(
        error,
        AppError::Pipeline(PipelineError::NotConfirmed)
    ));
}

#[tokio::test]
async fn test_switchAlternative_shouldSwapWithoutRevalidation() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    let job = dubflow::database::models::JobRecord::new(
        "job-2".to_string(),
        "/media/job-2.mp4".to_string(),
        "hash-job-2".to_string(),
        "bn".to_string(),
    );
    repository.create_job(&job).await.unwrap();

    let original_text = "মূল পাঠ।".to_string();
    let segment = dubflow::database::models::SegmentRecord::new_validated(
        "job-2".to_string(),
        0,
        original_text.clone(),
        0,
        2_500,
        0.9,
        "whisper".to_string(),
    )
    .unwrap()
    .with_alternative("বিকল্প পাঠ।".to_string(), "deepgram".to_string());
    repository.insert_segments(vec![segment]).await.unwrap();
    let stored = repository.get_segments("job-2").await.unwrap();

    let controller = common::controller_with(repository.clone(), vec![], vec![]);
    let swapped = controller.switch_alternative(stored[0].id).await.unwrap();

    assert_eq!(swapped.text, "বিকল্প পাঠ।");
    assert_eq!(swapped.alternative_text.as_deref(), Some(original_text.as_str()));
    assert!(swapped.is_alternative_selected);
}

#[tokio::test]
async fn test_dub_shouldWriteOneClipPerSegmentAndPersistVoice() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    common::seed_reconciled_job(&repository, "job-1", 3).await;

    let synthesis = Arc::new(MockSynthesis::new());
    let chain: Vec<Arc<dyn TranslationModel>> =
        vec![Arc::new(MockTranslator::working("anthropic"))];
    let controller = dubflow::pipeline::PipelineController::with_providers(
        common::test_config(),
        repository.clone(),
        vec![],
        chain,
        synthesis.clone(),
    );

    controller.confirm_source("job-1").await.unwrap();
    controller.translate("job-1", "en").await.unwrap();

    let output_dir = tempfile::tempdir().unwrap();
    let written = controller
        .dub("job-1", "en", Some("voice-42".to_string()), output_dir.path())
        .await
        .unwrap();

    assert_eq!(written.len(), 3);
    assert_eq!(synthesis.request_count(), 3);
    for path in &written {
        assert!(path.exists());
    }

    // The chosen voice lives on the job record, not in process state
    let job = repository.get_job("job-1").await.unwrap().unwrap();
    assert_eq!(job.voice_id.as_deref(), Some("voice-42"));
}

#[tokio::test]
async fn test_dub_withoutTranslations_shouldBeRejected() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    common::seed_reconciled_job(&repository, "job-1", 2).await;

    let controller = common::controller_with(repository, vec![], vec![]);

    let output_dir = tempfile::tempdir().unwrap();
    let error = controller
        .dub("job-1", "en", Some("voice-42".to_string()), output_dir.path())
        .await
        .err()
        .unwrap();

    assert!(matches!(
        error,
        AppError::Pipeline(PipelineError::NoTranslations { .. })
    ));
}

#[tokio::test]
async fn test_confirmSource_onPendingJob_shouldBeRejected() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    let job = dubflow::database::models::JobRecord::new(
        "job-pending".to_string(),
        "/media/input.mp4".to_string(),
        "hash".to_string(),
        "bn".to_string(),
    );
    repository.create_job(&job).await.unwrap();

    let controller = common::controller_with(repository, vec![], vec![]);
    assert!(controller.confirm_source("job-pending").await.is_err());
}
