use crate::config::Config;
use crate::error::{format_bytes, PlistPngError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub const REPORT_FILE_NAME: &str = "recovery_report.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub albums: Vec<AlbumReport>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub cancelled: bool,
    pub config_used: ConfigSnapshot,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlbumReport {
    pub name: String,
    pub album_path: PathBuf,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub renamed: usize,
    pub fragments_found: usize,
    pub fragments_discarded: usize,
    pub images_recovered: usize,
    pub images_collected: usize,
    pub bytes_processed: u64,
    pub errors: Vec<String>,
    pub duration: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub input_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub album_dir: PathBuf,
    pub copy_extension: String,
    pub rename_sources: bool,
    pub max_file_size: u64,
    pub exclude_patterns: Vec<String>,
}

impl From<&Config> for ConfigSnapshot {
    fn from(config: &Config) -> Self {
        Self {
            input_dir: config.paths.input_dir.clone(),
            scratch_dir: config.paths.scratch_dir.clone(),
            album_dir: config.paths.album_dir.clone(),
            copy_extension: config.recovery.copy_extension.clone(),
            rename_sources: config.recovery.rename_sources,
            max_file_size: config.recovery.max_file_size,
            exclude_patterns: config.recovery.exclude_patterns.clone(),
        }
    }
}

impl AlbumReport {
    pub fn new<S: Into<String>>(name: S, album_path: PathBuf) -> Self {
        Self {
            name: name.into(),
            album_path,
            ..Self::default()
        }
    }
}

impl RecoveryReport {
    pub fn new(config: &Config) -> Self {
        Self {
            albums: Vec::new(),
            started_at: Utc::now(),
            duration: Duration::from_secs(0),
            cancelled: false,
            config_used: ConfigSnapshot::from(config),
        }
    }

    pub fn total_files_scanned(&self) -> usize {
        self.albums.iter().map(|a| a.files_scanned).sum()
    }

    pub fn total_files_skipped(&self) -> usize {
        self.albums.iter().map(|a| a.files_skipped).sum()
    }

    pub fn total_images_recovered(&self) -> usize {
        self.albums.iter().map(|a| a.images_recovered).sum()
    }

    pub fn total_images_collected(&self) -> usize {
        self.albums.iter().map(|a| a.images_collected).sum()
    }

    pub fn total_bytes_processed(&self) -> u64 {
        self.albums.iter().map(|a| a.bytes_processed).sum()
    }

    pub fn errors(&self) -> impl Iterator<Item = &String> {
        self.albums.iter().flat_map(|a| a.errors.iter())
    }
}

/// Owns the scratch root and the album root of a run.
///
/// Every album works in its own temporary directory under the scratch root,
/// removed when the returned `TempDir` drops. The scratch root itself is
/// removed by [`OutputManager::finish`] only if this run created it.
pub struct OutputManager {
    scratch_root: PathBuf,
    album_root: PathBuf,
    created_scratch_root: bool,
}

impl OutputManager {
    pub fn new(scratch_root: PathBuf, album_root: PathBuf) -> Result<Self> {
        let created_scratch_root = !scratch_root.exists();

        let manager = Self {
            scratch_root,
            album_root,
            created_scratch_root,
        };

        manager.validate_paths()?;
        Ok(manager)
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    pub fn album_root(&self) -> &Path {
        &self.album_root
    }

    pub fn album_dir(&self, album_name: &str) -> PathBuf {
        self.album_root.join(album_name)
    }

    pub fn create_album_scratch(&self, album_name: &str) -> Result<TempDir> {
        let prefix = format!("{}-", sanitize_album_name(album_name));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(&self.scratch_root)?;
        Ok(dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.album_root.join(REPORT_FILE_NAME)
    }

    pub fn save_report_json(&self, report: &RecoveryReport) -> Result<PathBuf> {
        let report_path = self.report_path();
        let json_content =
            serde_json::to_string_pretty(report).map_err(|e| PlistPngError::Config {
                message: format!("Failed to serialize report to JSON: {}", e),
            })?;

        let mut file = fs::File::create(&report_path)?;
        file.write_all(json_content.as_bytes())?;
        writeln!(file)?;

        Ok(report_path)
    }

    /// Removes the scratch root when this run created it. Returns whether a
    /// directory was removed.
    pub fn finish(&self) -> Result<bool> {
        if self.created_scratch_root && self.scratch_root.exists() {
            fs::remove_dir_all(&self.scratch_root)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn validate_paths(&self) -> Result<()> {
        for dir in [&self.scratch_root, &self.album_root] {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| PlistPngError::Permission {
                    path: format!("Cannot create directory {}: {}", dir.display(), e),
                })?;
            }

            let test_file = dir.join(".plistpng_write_test");
            match fs::File::create(&test_file) {
                Ok(_) => {
                    let _ = fs::remove_file(&test_file);
                }
                Err(e) => {
                    return Err(PlistPngError::Permission {
                        path: format!(
                            "No write permission for directory {}: {}",
                            dir.display(),
                            e
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

pub fn describe_album(report: &AlbumReport) -> String {
    format!(
        "{}: {} file(s), {} skipped, {} image(s) recovered, {} collected ({})",
        report.name,
        report.files_scanned,
        report.files_skipped,
        report.images_recovered,
        report.images_collected,
        format_bytes(report.bytes_processed)
    )
}

fn sanitize_album_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "album".to_string()
    } else if sanitized.chars().count() > 64 {
        sanitized.chars().take(64).collect()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn album(name: &str, scanned: usize, collected: usize) -> AlbumReport {
        AlbumReport {
            files_scanned: scanned,
            images_recovered: collected,
            images_collected: collected,
            bytes_processed: 2048,
            ..AlbumReport::new(name, PathBuf::from("album").join(name))
        }
    }

    #[test]
    fn test_output_manager_creates_roots() {
        let temp_dir = TempDir::new().unwrap();
        let scratch = temp_dir.path().join("output");
        let albums = temp_dir.path().join("album");

        let manager = OutputManager::new(scratch.clone(), albums.clone()).unwrap();

        assert!(scratch.is_dir());
        assert!(albums.is_dir());
        assert_eq!(manager.album_dir("Trip"), albums.join("Trip"));
        assert!(!scratch.join(".plistpng_write_test").exists());
    }

    #[test]
    fn test_album_scratch_is_unique_and_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(
            temp_dir.path().join("output"),
            temp_dir.path().join("album"),
        )
        .unwrap();

        let first = manager.create_album_scratch("Trip").unwrap();
        let second = manager.create_album_scratch("Trip").unwrap();

        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(manager.scratch_root()));
        let name = first.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Trip-"));

        let kept = first.path().to_path_buf();
        drop(first);
        assert!(!kept.exists());
    }

    #[test]
    fn test_finish_removes_only_created_scratch_root() {
        let temp_dir = TempDir::new().unwrap();

        let created = temp_dir.path().join("fresh");
        let manager = OutputManager::new(created.clone(), temp_dir.path().join("a1")).unwrap();
        assert!(manager.finish().unwrap());
        assert!(!created.exists());

        let existing = temp_dir.path().join("existing");
        fs::create_dir(&existing).unwrap();
        let manager = OutputManager::new(existing.clone(), temp_dir.path().join("a2")).unwrap();
        assert!(!manager.finish().unwrap());
        assert!(existing.exists());
    }

    #[test]
    fn test_save_report_json() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(
            temp_dir.path().join("output"),
            temp_dir.path().join("album"),
        )
        .unwrap();

        let mut report = RecoveryReport::new(&Config::default());
        report.albums.push(album("Trip", 3, 2));
        report.albums.push(album("Home", 1, 0));

        let path = manager.save_report_json(&report).unwrap();
        assert_eq!(path, temp_dir.path().join("album").join(REPORT_FILE_NAME));

        let loaded: RecoveryReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.albums.len(), 2);
        assert_eq!(loaded.total_images_collected(), 2);
        assert_eq!(loaded.config_used.copy_extension, "bplist");
    }

    #[test]
    fn test_report_totals() {
        let mut report = RecoveryReport::new(&Config::default());
        let mut trip = album("Trip", 4, 3);
        trip.files_skipped = 1;
        trip.errors.push("Invalid file: Trip_4.txt.bplist".to_string());
        report.albums.push(trip);
        report.albums.push(album("Home", 2, 1));

        assert_eq!(report.total_files_scanned(), 6);
        assert_eq!(report.total_files_skipped(), 1);
        assert_eq!(report.total_images_recovered(), 4);
        assert_eq!(report.total_bytes_processed(), 4096);
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn test_describe_album() {
        let line = describe_album(&album("Trip", 3, 2));
        assert_eq!(
            line,
            "Trip: 3 file(s), 0 skipped, 2 image(s) recovered, 2 collected (2.0 KB)"
        );
    }

    #[test]
    fn test_album_name_sanitization() {
        assert_eq!(sanitize_album_name("Trip-2024"), "Trip-2024");
        assert_eq!(sanitize_album_name("my trip/2"), "my_trip_2");
        assert_eq!(sanitize_album_name(""), "album");
        assert_eq!(sanitize_album_name(&"a".repeat(80)).len(), 64);
    }
}
