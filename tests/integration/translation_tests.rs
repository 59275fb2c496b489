/*!
 * Integration tests for the confirmation gate, batch translation and
 * translation upsert semantics.
 */

use std::sync::Arc;

use dubflow::database::Repository;
use dubflow::errors::{AppError, PipelineError};
use dubflow::providers::mock::{MockTranslationBehavior, MockTranslator};

use crate::common;

#[tokio::test]
async fn test_translate_beforeConfirmation_shouldBeRejected() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    common::seed_reconciled_job(&repository, "job-1", 3).await;

    let controller = common::controller_with(
        repository,
        vec![],
        vec![Arc::new(MockTranslator::working("anthropic"))],
    );

    let error = controller.translate("job-1", "en").await.err().unwrap();
    assert!(matches!(
        error,
        AppError::Pipeline(PipelineError::NotConfirmed)
    ));
}

#[tokio::test]
async fn test_translate_afterConfirmation_shouldStoreEverySegment() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    let segments = common::seed_reconciled_job(&repository, "job-1", 5).await;

    let controller = common::controller_with(
        repository.clone(),
        vec![],
        vec![Arc::new(MockTranslator::working("anthropic"))],
    );

    controller.confirm_source("job-1").await.unwrap();
    let summary = controller.translate("job-1", "en").await.unwrap();

    assert_eq!(summary.requested, 5);
    assert_eq!(summary.translated, 5);
    assert!(!summary.is_partial());

    let stored = repository.get_translations("job-1", "en").await.unwrap();
    assert_eq!(stored.len(), segments.len());
    for translation in &stored {
        assert!(translation.text.starts_with("Translated:"));
        assert!((0.0..=1.0).contains(&translation.confidence));
        assert_eq!(translation.provider, "anthropic");
    }
}

#[tokio::test]
async fn test_translate_withMangledSegment_shouldDetectOmission() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    common::seed_reconciled_job(&repository, "job-1", 3).await;

    // Batch size 2 puts segments 0 and 1 in the first batch; mangling prompt
    // index 1 drops the second segment of each batch it appears in.
    let controller = common::controller_with(
        repository.clone(),
        vec![],
        vec![Arc::new(MockTranslator::new(
            "anthropic",
            MockTranslationBehavior::MangleIndex(1),
        ))],
    );

    controller.confirm_source("job-1").await.unwrap();
    let summary = controller.translate("job-1", "en").await.unwrap();

    assert!(summary.is_partial());
    assert!(summary.translated < summary.requested);

    // The omission is detectable: fewer stored rows than segments
    let count = repository.count_translations("job-1", "en").await.unwrap();
    assert!((count as usize) < 3);
}

#[tokio::test]
async fn test_translate_rerun_shouldNotDuplicateRows() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    common::seed_reconciled_job(&repository, "job-1", 3).await;

    let controller = common::controller_with(
        repository.clone(),
        vec![],
        vec![Arc::new(MockTranslator::working("anthropic"))],
    );

    controller.confirm_source("job-1").await.unwrap();
    controller.translate("job-1", "en").await.unwrap();
    controller.translate("job-1", "en").await.unwrap();

    let count = repository.count_translations("job-1", "en").await.unwrap();
    assert_eq!(count, 3, "re-translation must upsert, not duplicate");
}

#[tokio::test]
async fn test_translate_withQuotaError_shouldFallBackToSecondProvider() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    common::seed_reconciled_job(&repository, "job-1", 2).await;

    let primary = Arc::new(MockTranslator::rate_limited("anthropic"));
    let fallback = Arc::new(MockTranslator::working("openai"));
    let controller = common::controller_with(
        repository.clone(),
        vec![],
        vec![primary.clone(), fallback.clone()],
    );

    controller.confirm_source("job-1").await.unwrap();
    let summary = controller.translate("job-1", "en").await.unwrap();

    assert_eq!(summary.translated, 2);
    assert!(primary.request_count() >= 1);
    assert!(fallback.request_count() >= 1);

    let stored = repository.get_translations("job-1", "en").await.unwrap();
    assert!(stored.iter().all(|t| t.provider == "openai"));
}

#[tokio::test]
async fn test_translate_withBothProvidersFailing_shouldNameBothReasons() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    common::seed_reconciled_job(&repository, "job-1", 2).await;

    let controller = common::controller_with(
        repository,
        vec![],
        vec![
            Arc::new(MockTranslator::rate_limited("anthropic")),
            Arc::new(MockTranslator::failing("openai")),
        ],
    );

    controller.confirm_source("job-1").await.unwrap();
    let error = controller.translate("job-1", "en").await.err().unwrap();

    match error {
        AppError::Pipeline(PipelineError::AllProvidersFailed { reasons }) => {
            assert!(reasons.contains("anthropic"));
            assert!(reasons.contains("openai"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_translateAll_shouldCoverEveryConfiguredLanguage() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    common::seed_reconciled_job(&repository, "job-1", 2).await;

    let controller = common::controller_with(
        repository.clone(),
        vec![],
        vec![Arc::new(MockTranslator::working("anthropic"))],
    );

    controller.confirm_source("job-1").await.unwrap();
    let summaries = controller.translate_all("job-1").await.unwrap();

    assert_eq!(summaries.len(), 5);
    for language in ["ar", "en", "es", "fr", "hi"] {
        assert!(summaries.iter().any(|s| s.target_language == language));
        let count = repository
            .count_translations("job-1", language)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}

#[tokio::test]
async fn test_translate_withUnknownJob_shouldReportJobNotFound() {
    common::init_logging();

    let repository = Repository::new_in_memory().unwrap();
    let controller = common::controller_with(
        repository,
        vec![],
        vec![Arc::new(MockTranslator::working("anthropic"))],
    );

    let error = controller.translate("missing", "en").await.err().unwrap();
    assert!(matches!(
        error,
        AppError::Pipeline(PipelineError::JobNotFound(_))
    ));
}
