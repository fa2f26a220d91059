use crate::config::RecoveryConfig;
use crate::error::{format_bytes, PlistPngError, Result};
use crate::scanner::file_filter::SourceFilter;
use std::fs;
use std::path::{Path, PathBuf};

/// One folder under the input root. Its name prefixes renamed sources and
/// names the album folder the recovered images end up in.
#[derive(Debug, Clone)]
pub struct Album {
    pub name: String,
    pub path: PathBuf,
}

impl Album {
    pub fn new(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self { name, path })
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub filename: String,
    /// File name without its last extension; names the scratch folder and
    /// every artifact derived from this source.
    pub base_name: String,
    pub size: u64,
}

impl SourceFile {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        let base_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        Self {
            path,
            filename,
            base_name,
            size,
        }
    }
}

pub struct AlbumScanner {
    filter: SourceFilter,
}

impl AlbumScanner {
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            filter: SourceFilter::new(config),
        }
    }

    /// Direct subdirectories of `input_root`, in listing order.
    pub fn scan_albums<P: AsRef<Path>>(&self, input_root: P) -> Result<Vec<Album>> {
        let root = input_root.as_ref();
        ensure_directory(root)?;

        let mut albums = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            if let Some(album) = Album::new(entry.path()) {
                albums.push(album);
            }
        }

        if albums.is_empty() {
            return Err(PlistPngError::NoAlbumsFound {
                input_dir: root.display().to_string(),
            });
        }

        Ok(albums)
    }

    /// Files directly inside the album folder, in listing order. Entries the
    /// filter rejects are left out; oversized files are kept so the caller
    /// can report them.
    pub fn scan_sources(&self, album: &Album) -> Result<Vec<SourceFile>> {
        ensure_directory(&album.path)?;

        let mut sources = Vec::new();
        for entry in fs::read_dir(&album.path)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let path = entry.path();
            if !self.filter.is_source_file(&path) {
                continue;
            }

            sources.push(SourceFile::new(path, metadata.len()));
        }

        Ok(sources)
    }

    pub fn check_size(&self, source: &SourceFile) -> Result<()> {
        if self.filter.is_size_allowed(source.size) {
            Ok(())
        } else {
            Err(PlistPngError::FileTooLarge {
                size: source.size,
                max_size: self.filter.max_file_size(),
            })
        }
    }

    pub fn get_statistics(&self, sources: &[SourceFile]) -> ScanStatistics {
        let (largest_file_size, largest_file_path) = sources
            .iter()
            .max_by_key(|s| s.size)
            .map(|s| (s.size, s.path.clone()))
            .unwrap_or((0, PathBuf::new()));

        ScanStatistics {
            total_files: sources.len(),
            total_size: sources.iter().map(|s| s.size).sum(),
            oversized_files: sources
                .iter()
                .filter(|s| !self.filter.is_size_allowed(s.size))
                .count(),
            largest_file_size,
            largest_file_path,
        }
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PlistPngError::InvalidPath {
            path: path.display().to_string(),
        });
    }

    if !path.is_dir() {
        return Err(PlistPngError::InvalidPath {
            path: format!("{} is not a directory", path.display()),
        });
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct ScanStatistics {
    pub total_files: usize,
    pub total_size: u64,
    pub oversized_files: usize,
    pub largest_file_size: u64,
    pub largest_file_path: PathBuf,
}

impl ScanStatistics {
    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Scan Results:\n  Source files: {}\n  Total size: {}\n",
            self.total_files,
            format_bytes(self.total_size)
        );

        if self.oversized_files > 0 {
            summary.push_str(&format!(
                "  Over size limit: {} files\n",
                self.oversized_files
            ));
        }

        if self.largest_file_size > 0 {
            summary.push_str(&format!(
                "  Largest file: {} ({})\n",
                self.largest_file_path.display(),
                format_bytes(self.largest_file_size)
            ));
        }

        summary
    }
}
