// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::path::PathBuf;

use dubflow::app_config::{Config, SttProvider};
use dubflow::database::Repository;
use dubflow::file_utils::FileManager;
use dubflow::pipeline::PipelineController;

/// CLI wrapper for SttProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSttProvider {
    Whisper,
    Deepgram,
}

impl From<CliSttProvider> for SttProvider {
    fn from(cli_provider: CliSttProvider) -> Self {
        match cli_provider {
            CliSttProvider::Whisper => SttProvider::Whisper,
            CliSttProvider::Deepgram => SttProvider::Deepgram,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcribe a media file (or every media file in a directory)
    Transcribe {
        /// Input media file or directory
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Restrict the provider chain to a subset, in priority order
        #[arg(short, long, value_enum)]
        provider: Option<Vec<CliSttProvider>>,
    },

    /// Confirm a job's source transcript for translation
    Confirm {
        /// Job identifier
        job_id: String,
    },

    /// Translate a confirmed job into one or all configured target languages
    Translate {
        /// Job identifier
        job_id: String,

        /// Target language code; all configured languages when omitted
        #[arg(short, long)]
        target_language: Option<String>,
    },

    /// Re-translate a single segment, overwriting the stored translation
    Retranslate {
        /// Segment identifier
        segment_id: i64,

        /// Target language code
        #[arg(short, long)]
        target_language: String,
    },

    /// Swap a segment's text with its alternative transcript
    Switch {
        /// Segment identifier
        segment_id: i64,
    },

    /// Render dubbing audio for a job's translations
    Dub {
        /// Job identifier
        job_id: String,

        /// Target language code
        #[arg(short, long)]
        target_language: String,

        /// Voice to synthesize with; falls back to the job's voice, then config
        #[arg(short, long)]
        voice_id: Option<String>,

        /// Output directory for audio clips
        #[arg(short, long, default_value = "dubs")]
        output_dir: PathBuf,
    },

    /// Show a job's status, or overall database statistics
    Status {
        /// Job identifier; omit for database statistics
        job_id: Option<String>,
    },

    /// Generate shell completions for dubflow
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Dubflow - AI transcription, translation and dubbing pipeline
///
/// Transcribes spoken-language video through multiple speech-to-text
/// providers, reconciles the results, translates the confirmed transcript
/// and renders dubbing audio.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,
}

/// Minimal stderr logger honoring the configured level
struct AppLogger {
    level: LevelFilter,
}

impl Log for AppLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut stderr = std::io::stderr().lock();
            let _ = match record.level() {
                Level::Error => writeln!(stderr, "error: {}", record.args()),
                Level::Warn => writeln!(stderr, "warning: {}", record.args()),
                _ => writeln!(stderr, "{}", record.args()),
            };
        }
    }

    fn flush(&self) {}
}

fn init_logging(level: LevelFilter) -> Result<()> {
    log::set_boxed_logger(Box::new(AppLogger { level }))
        .map(|()| log::set_max_level(level))
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))
}

fn progress_bar(total: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message(message.to_string());
    bar
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "dubflow", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::from_file_or_default(&cli.config_path)?;
    init_logging(config.log_level.to_level_filter())?;

    let repository = Repository::new_default()?;
    let controller = PipelineController::new(config.clone(), repository);

    match cli.command {
        Commands::Transcribe {
            input_path,
            provider,
        } => {
            let providers: Option<Vec<SttProvider>> =
                provider.map(|list| list.into_iter().map(Into::into).collect());

            let inputs = if input_path.is_dir() {
                FileManager::find_media_files(&input_path)?
            } else if FileManager::file_exists(&input_path) {
                vec![input_path]
            } else {
                return Err(anyhow!("Input does not exist: {:?}", input_path));
            };
            if inputs.is_empty() {
                return Err(anyhow!("No media files found"));
            }

            for input in inputs {
                info!("Transcribing {:?}", input);
                let job = controller
                    .start_transcription(&input, providers.clone())
                    .await?;
                match job.error_message {
                    None => println!("{}  {}  {}", job.id, job.status, job.media_path),
                    Some(message) => {
                        error!("Job {} failed: {}", job.id, message);
                        println!("{}  {}  {}", job.id, job.status, job.media_path);
                    }
                }
            }
        }

        Commands::Confirm { job_id } => {
            controller.confirm_source(&job_id).await?;
            println!("Confirmed source transcript of job {}", job_id);
        }

        Commands::Translate {
            job_id,
            target_language,
        } => match target_language {
            Some(language) => {
                let segments = controller.repository().get_segments(&job_id).await?;
                let batches = segments
                    .len()
                    .div_ceil(config.translation.batch_size.max(1));
                let bar = progress_bar(batches as u64, &format!("Translating to {}", language));

                let bar_handle = bar.clone();
                let summary = controller
                    .translate_with_progress(&job_id, &language, move |done, _total| {
                        bar_handle.set_position(done as u64);
                    })
                    .await?;
                bar.finish();

                report_summary(&summary);
            }
            None => {
                let summaries = controller.translate_all(&job_id).await?;
                for summary in &summaries {
                    report_summary(summary);
                }
            }
        },

        Commands::Retranslate {
            segment_id,
            target_language,
        } => {
            let record = controller.retranslate(segment_id, &target_language).await?;
            println!(
                "Segment {} -> {} ({:.2}): {}",
                segment_id, record.target_language, record.confidence, record.text
            );
        }

        Commands::Switch { segment_id } => {
            let segment = controller.switch_alternative(segment_id).await?;
            println!("Segment {} now reads: {}", segment_id, segment.text);
        }

        Commands::Dub {
            job_id,
            target_language,
            voice_id,
            output_dir,
        } => {
            let written = controller
                .dub(&job_id, &target_language, voice_id, &output_dir)
                .await?;
            println!("Wrote {} dub clips to {:?}", written.len(), output_dir);
        }

        Commands::Status { job_id } => match job_id {
            Some(id) => {
                let job = controller
                    .repository()
                    .get_job(&id)
                    .await?
                    .ok_or_else(|| anyhow!("No job with id {}", id))?;
                println!("Job:        {}", job.id);
                println!("Media:      {}", job.media_path);
                println!("Status:     {}", job.status);
                println!("Confirmed:  {}", job.source_confirmed);
                if let Some(message) = &job.error_message {
                    println!("Error:      {}", message);
                    println!(
                        "Retryable:  {}",
                        job.error_retryable.unwrap_or(false)
                    );
                }
            }
            None => {
                let stats = controller.repository().connection().stats()?;
                println!("{}", stats);
            }
        },

        Commands::Completions { .. } => unreachable!("handled before config load"),
    }

    Ok(())
}

fn report_summary(summary: &dubflow::pipeline::TranslationSummary) {
    if summary.is_partial() {
        println!(
            "{}: {}/{} segments translated ({} missing - partial translation)",
            summary.target_language, summary.translated, summary.requested, summary.missing
        );
    } else {
        println!(
            "{}: {}/{} segments translated",
            summary.target_language, summary.translated, summary.requested
        );
    }
}
