use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Media file extensions the pipeline accepts as input
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "mp3", "wav", "m4a"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Whether a path looks like a media file the pipeline can ingest
    pub fn is_media_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                MEDIA_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// Find media files under a directory, recursively
    pub fn find_media_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::is_media_file(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// SHA256 hash of a file's content, hex encoded.
    ///
    /// Used to key jobs so re-ingesting the same media resumes instead of
    /// duplicating work.
    pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<String> {
        let content = fs::read(&path)
            .with_context(|| format!("Failed to read file for hashing: {:?}", path.as_ref()))?;

        let mut hasher = Sha256::new();
        hasher.update(&content);
        let digest = hasher.finalize();

        Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Write bytes to a file, ensuring the parent directory exists
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_isMediaFile_shouldRecognizeCommonContainers() {
        assert!(FileManager::is_media_file("video.mp4"));
        assert!(FileManager::is_media_file("video.MKV"));
        assert!(FileManager::is_media_file("audio.wav"));
        assert!(!FileManager::is_media_file("notes.txt"));
        assert!(!FileManager::is_media_file("no_extension"));
    }

    #[test]
    fn test_findMediaFiles_shouldFindOnlyMedia() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        fs::write(dir.path().join("b.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.wav"), b"x").unwrap();

        let found = FileManager::find_media_files(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_hashFile_shouldBeStableAndContentSensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("media.mp4");
        fs::write(&path, b"same content").unwrap();

        let first = FileManager::hash_file(&path).unwrap();
        let second = FileManager::hash_file(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        fs::write(&path, b"different content").unwrap();
        assert_ne!(FileManager::hash_file(&path).unwrap(), first);
    }

    #[test]
    fn test_ensureDir_shouldCreateNestedDirectories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");

        FileManager::ensure_dir(&nested).unwrap();
        assert!(FileManager::dir_exists(&nested));
    }
}
