/*!
 * Media extraction boundary.
 *
 * Given a source video or audio path, produces a mono 16 kHz PCM WAV stream
 * and a duration via ffmpeg/ffprobe. Missing files and undecodable formats
 * surface as [`MediaError`] variants that the classifier maps to the
 * FILE_NOT_FOUND and UNSUPPORTED_FORMAT codes.
 */

use std::path::{Path, PathBuf};

use bytes::Bytes;
use log::{debug, info};
use tempfile::TempDir;
use tokio::process::Command;

use crate::errors::MediaError;

/// Extracted audio stream with its backing temp directory.
///
/// The WAV file lives inside `_workdir` and is removed when the extraction
/// result is dropped.
pub struct ExtractedAudio {
    /// Path to the extracted mono 16 kHz WAV file
    pub wav_path: PathBuf,
    /// Media duration in milliseconds
    pub duration_ms: u64,
    _workdir: TempDir,
}

impl ExtractedAudio {
    /// Read the extracted WAV bytes
    pub async fn read_bytes(&self) -> Result<Bytes, MediaError> {
        tokio::fs::read(&self.wav_path)
            .await
            .map(Bytes::from)
            .map_err(|e| MediaError::ExtractionFailed(e.to_string()))
    }
}

/// Extract a mono 16 kHz PCM WAV stream and duration from a media file
pub async fn extract_audio(input: &Path) -> Result<ExtractedAudio, MediaError> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let duration_ms = probe_duration_ms(input).await?;
    debug!("Probed duration of {:?}: {}ms", input, duration_ms);

    let workdir = TempDir::new().map_err(|e| MediaError::ExtractionFailed(e.to_string()))?;
    let wav_path = workdir.path().join("audio.wav");

    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(input)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
        .arg(&wav_path)
        .output()
        .await
        .map_err(|e| MediaError::ExtractionFailed(format!("failed to run ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(map_ffmpeg_failure(&stderr));
    }

    info!("Extracted audio from {:?} to {:?}", input, wav_path);

    Ok(ExtractedAudio {
        wav_path,
        duration_ms,
        _workdir: workdir,
    })
}

/// Probe the media duration in milliseconds via ffprobe
async fn probe_duration_ms(input: &Path) -> Result<u64, MediaError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
        .arg(input)
        .output()
        .await
        .map_err(|e| MediaError::ExtractionFailed(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(map_ffmpeg_failure(&stderr));
    }

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| MediaError::ExtractionFailed(format!("unreadable ffprobe output: {}", e)))?;

    let seconds: f64 = value
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse().ok())
        .ok_or_else(|| {
            MediaError::UnsupportedFormat("media carries no readable duration".to_string())
        })?;

    Ok((seconds * 1000.0) as u64)
}

/// Map ffmpeg/ffprobe stderr into the media error taxonomy
fn map_ffmpeg_failure(stderr: &str) -> MediaError {
    let lowered = stderr.to_lowercase();
    if lowered.contains("no such file") {
        MediaError::FileNotFound(PathBuf::from(
            stderr.lines().next().unwrap_or("unknown").to_string(),
        ))
    } else if lowered.contains("invalid data found")
        || lowered.contains("codec")
        || lowered.contains("unknown format")
    {
        MediaError::UnsupportedFormat(stderr.lines().last().unwrap_or("unknown").to_string())
    } else {
        MediaError::ExtractionFailed(stderr.lines().last().unwrap_or("unknown").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{classify_media_error, ErrorCode};

    #[tokio::test]
    async fn test_extractAudio_withMissingFile_shouldReturnFileNotFound() {
        let result = extract_audio(Path::new("/definitely/not/here.mp4")).await;

        let error = result.err().expect("extraction must fail");
        assert!(matches!(error, MediaError::FileNotFound(_)));
        assert_eq!(classify_media_error(&error).code, ErrorCode::FileNotFound);
    }

    #[test]
    fn test_mapFfmpegFailure_withCodecError_shouldBeUnsupportedFormat() {
        let error = map_ffmpeg_failure("input.mkv: Invalid data found when processing input");
        assert!(matches!(error, MediaError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_mapFfmpegFailure_withOtherError_shouldBeExtractionFailed() {
        let error = map_ffmpeg_failure("Permission denied");
        assert!(matches!(error, MediaError::ExtractionFailed(_)));
    }
}
