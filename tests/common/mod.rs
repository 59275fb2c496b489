/*!
 * Common test utilities shared by the integration tests.
 */

use std::sync::Arc;

use dubflow::app_config::Config;
use dubflow::database::models::{JobRecord, JobStatus, SegmentRecord};
use dubflow::database::Repository;
use dubflow::pipeline::PipelineController;
use dubflow::providers::mock::MockSynthesis;
use dubflow::providers::{SpeechToText, TranslationModel};

/// Initialize test logging once
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A config with a small batch size so batching paths are exercised
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.translation.batch_size = 2;
    config
}

/// Build a controller over an in-memory repository and the given providers
pub fn controller_with(
    repository: Repository,
    stt: Vec<Arc<dyn SpeechToText>>,
    chain: Vec<Arc<dyn TranslationModel>>,
) -> PipelineController {
    PipelineController::with_providers(
        test_config(),
        repository,
        stt,
        chain,
        Arc::new(MockSynthesis::new()),
    )
}

/// Seed a reconciled job with `count` Bengali segments and return their records
pub async fn seed_reconciled_job(
    repository: &Repository,
    job_id: &str,
    count: usize,
) -> Vec<SegmentRecord> {
    let job = JobRecord::new(
        job_id.to_string(),
        format!("/media/{}.mp4", job_id),
        format!("hash-{}", job_id),
        "bn".to_string(),
    );
    repository.create_job(&job).await.unwrap();

    let texts = [
        "আমি একটি পরীক্ষা ভিডিও তৈরি করছি।",
        "এটি দ্বিতীয় বাক্য।",
        "এটি তৃতীয় বাক্য।",
        "এটি চতুর্থ বাক্য।",
        "এটি পঞ্চম বাক্য।",
    ];

    let segments: Vec<SegmentRecord> = (0..count)
        .map(|i| {
            let start = i as i64 * 3_000;
            SegmentRecord::new_validated(
                job_id.to_string(),
                i as i64,
                texts[i % texts.len()].to_string(),
                start,
                start + 2_500,
                0.9,
                "whisper".to_string(),
            )
            .unwrap()
        })
        .collect();

    repository.insert_segments(segments).await.unwrap();
    repository
        .update_job_status(job_id, JobStatus::Reconciled)
        .await
        .unwrap();

    repository.get_segments(job_id).await.unwrap()
}
