use crate::error::{PlistPngError, Result};
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copies every recovered image found anywhere under a scratch tree into one
/// flat album folder.
pub struct AlbumCollector {
    extension: String,
    buffer_size: usize,
}

impl AlbumCollector {
    pub fn new() -> Self {
        Self {
            extension: ".png".to_string(),
            buffer_size: 64 * 1024, // 64KB buffer
        }
    }

    /// Wipes `album_dir` and creates it again empty.
    pub fn prepare_album(&self, album_dir: &Path) -> Result<()> {
        if album_dir.exists() {
            fs::remove_dir_all(album_dir)?;
        }
        fs::create_dir_all(album_dir)?;
        Ok(())
    }

    /// Name match is case-sensitive on the file name suffix. Files with the
    /// same name overwrite each other in the album.
    pub fn find_images(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut images = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let is_image = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(&self.extension));
            if is_image {
                images.push(entry.into_path());
            }
        }

        Ok(images)
    }

    /// Returns the destination of every copied image.
    pub fn collect(&self, scratch_root: &Path, album_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(album_dir)?;

        let mut copied = Vec::new();
        for image in self.find_images(scratch_root)? {
            let file_name = image.file_name().ok_or_else(|| PlistPngError::InvalidPath {
                path: image.display().to_string(),
            })?;
            let dest = album_dir.join(file_name);
            self.copy_file_with_buffer(&image, &dest)?;
            copied.push(dest);
        }

        Ok(copied)
    }

    fn copy_file_with_buffer(&self, source: &Path, dest: &Path) -> Result<u64> {
        let source_file = fs::File::open(source)?;
        let dest_file = fs::File::create(dest)?;

        let mut reader = BufReader::with_capacity(self.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.buffer_size, dest_file);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; 8192]; // 8KB chunks

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            writer.write_all(&buffer[..bytes_read])?;
            total_bytes += bytes_read as u64;
        }

        writer.flush()?;

        if let Ok(source_metadata) = fs::metadata(source) {
            if let Ok(modified_time) = source_metadata.modified() {
                let _ = filetime::set_file_mtime(
                    dest,
                    filetime::FileTime::from_system_time(modified_time),
                );
            }
        }

        Ok(total_bytes)
    }
}

impl Default for AlbumCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_flattens_nested_images() {
        let scratch = TempDir::new().unwrap();
        let album_root = TempDir::new().unwrap();
        let album_dir = album_root.path().join("Trip");

        let root = scratch.path();
        fs::create_dir_all(root.join("Trip_1/output")).unwrap();
        fs::create_dir_all(root.join("Trip_2/output/deeper")).unwrap();
        fs::create_dir_all(root.join("Trip_2/binarytext")).unwrap();
        fs::write(root.join("Trip_1/output/Trip_1_output1.png"), b"one").unwrap();
        fs::write(root.join("Trip_2/output/Trip_2_output1.png"), b"two").unwrap();
        fs::write(root.join("Trip_2/output/deeper/stray.png"), b"three").unwrap();
        fs::write(root.join("Trip_2/binarytext/Trip_2binaryText1.txt"), b"text").unwrap();
        fs::write(root.join("Trip_2/output/upper.PNG"), b"case").unwrap();

        let collector = AlbumCollector::new();
        let expected = collector.find_images(root).unwrap().len();
        let copied = collector.collect(root, &album_dir).unwrap();

        assert_eq!(expected, 3);
        assert_eq!(copied.len(), expected);
        assert_eq!(fs::read_dir(&album_dir).unwrap().count(), 3);
        assert_eq!(fs::read(album_dir.join("stray.png")).unwrap(), b"three");
        assert!(!album_dir.join("upper.PNG").exists());
    }

    #[test]
    fn test_collect_empty_tree() {
        let scratch = TempDir::new().unwrap();
        let album_root = TempDir::new().unwrap();
        let album_dir = album_root.path().join("Empty");

        let copied = AlbumCollector::new()
            .collect(scratch.path(), &album_dir)
            .unwrap();

        assert!(copied.is_empty());
        assert!(album_dir.is_dir());
    }

    #[test]
    fn test_prepare_album_wipes_previous_content() {
        let album_root = TempDir::new().unwrap();
        let album_dir = album_root.path().join("Trip");
        fs::create_dir_all(&album_dir).unwrap();
        fs::write(album_dir.join("old_output1.png"), b"old").unwrap();

        AlbumCollector::new().prepare_album(&album_dir).unwrap();

        assert!(album_dir.is_dir());
        assert_eq!(fs::read_dir(&album_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_copy_preserves_content() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("big.png");
        let dest = temp_dir.path().join("copy.png");
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&source, &content).unwrap();

        let collector = AlbumCollector::new();
        let bytes = collector.copy_file_with_buffer(&source, &dest).unwrap();

        assert_eq!(bytes, content.len() as u64);
        assert_eq!(fs::read(&dest).unwrap(), content);
    }
}
