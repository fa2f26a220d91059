use crate::error::{PlistPngError, Result};
use crate::extractor::image_recoverer::{ImageRecoverer, RecoveryOutcome};
use crate::extractor::loader::PlistLoader;
use crate::extractor::text_dump::{render_value, FragmentMatcher};
use crate::scanner::SourceFile;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const FRAGMENT_DIR: &str = "binarytext";
const IMAGE_DIR: &str = "output";

#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub bytes_processed: u64,
    pub total_bytes: u64,
    pub images_recovered: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
}

impl ExtractionProgress {
    pub fn new(total_files: usize, total_bytes: u64) -> Self {
        Self {
            files_processed: 0,
            total_files,
            bytes_processed: 0,
            total_bytes,
            images_recovered: 0,
            current_file: None,
            start_time: Instant::now(),
        }
    }

    pub fn update_file(&mut self, filename: String, bytes: u64, images: usize) {
        self.files_processed += 1;
        self.bytes_processed += bytes;
        self.images_recovered += images;
        self.current_file = Some(filename);
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.files_processed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.elapsed();
        let rate = self.files_processed as f64 / elapsed.as_secs_f64();
        let remaining_files = self.total_files.saturating_sub(self.files_processed);

        if rate > 0.0 {
            Duration::from_secs_f64(remaining_files as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

/// What one source produced in the scratch tree.
#[derive(Debug, Clone, Default)]
pub struct SourceExtraction {
    pub fragments: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
    pub discarded: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum SourceOutcome {
    Extracted(SourceExtraction),
    Skipped { reason: String },
}

/// Runs one source through copy, decode, dump, fragment capture and image
/// recovery, laying its artifacts out as
/// `<scratch>/<base>/binarytext/<base>binaryText<N>.txt` and
/// `<scratch>/<base>/output/<base>_output<N>.png`.
pub struct SourceExtractor {
    loader: PlistLoader,
    matcher: FragmentMatcher,
    recoverer: ImageRecoverer,
}

impl SourceExtractor {
    pub fn new<S: Into<String>>(copy_extension: S) -> Result<Self> {
        Ok(Self {
            loader: PlistLoader::new(copy_extension),
            matcher: FragmentMatcher::new()?,
            recoverer: ImageRecoverer::new(),
        })
    }

    pub fn fragment_name(base_name: &str, index: usize) -> String {
        format!("{}binaryText{}.txt", base_name, index)
    }

    /// The decode copy is pushed onto `copies` as soon as it exists, so the
    /// caller can remove it even when a later step fails.
    pub fn extract(
        &self,
        source: &SourceFile,
        scratch_root: &Path,
        copies: &mut Vec<PathBuf>,
    ) -> Result<SourceOutcome> {
        let copy_path = self.loader.create_copy(&source.path)?;
        copies.push(copy_path.clone());

        let value = match self.loader.decode(&copy_path) {
            Ok(value) => value,
            Err(PlistPngError::InvalidPlist { path, source }) => {
                return Ok(SourceOutcome::Skipped {
                    reason: format!("Invalid file: {} ({})", path, source),
                });
            }
            Err(e) => return Err(e),
        };

        let dump = render_value(&value);
        drop(value);

        let parent_dir = scratch_root.join(&source.base_name);
        let fragment_dir = parent_dir.join(FRAGMENT_DIR);
        fs::create_dir_all(&fragment_dir)?;

        let mut extraction = SourceExtraction::default();
        for (i, fragment) in self.matcher.find_fragments(&dump).into_iter().enumerate() {
            let path = fragment_dir.join(Self::fragment_name(&source.base_name, i + 1));
            fs::write(&path, fragment)?;
            extraction.fragments.push(path);
        }

        let image_dir = parent_dir.join(IMAGE_DIR);
        fs::create_dir_all(&image_dir)?;

        let mut image_counter = 1;
        for fragment_path in &extraction.fragments {
            let fragment = fs::read_to_string(fragment_path)?;
            let dest = image_dir.join(ImageRecoverer::output_name(&source.base_name, image_counter));

            match self.recoverer.recover(&fragment, &dest)? {
                RecoveryOutcome::Saved { path, .. } => {
                    extraction.images.push(path);
                    image_counter += 1;
                }
                RecoveryOutcome::Discarded { reason } => {
                    extraction.discarded.push(format!(
                        "The binary data in {} is not a valid PNG image: {}",
                        fragment_path.display(),
                        reason
                    ));
                }
            }
        }

        Ok(SourceOutcome::Extracted(extraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::text_dump::{sample_png, PNG_SIGNATURE};
    use plist::{Dictionary, Value};
    use tempfile::TempDir;

    fn write_plist(path: &Path, value: Value) -> SourceFile {
        value.to_file_binary(path).unwrap();
        let size = fs::metadata(path).unwrap().len();
        SourceFile::new(path.to_path_buf(), size)
    }

    #[test]
    fn test_extract_lays_out_scratch_tree() {
        let input = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();

        let mut dict = Dictionary::new();
        dict.insert("thumbnail".to_string(), Value::Data(sample_png()));
        dict.insert("label".to_string(), Value::String("Beach".to_string()));
        let source = write_plist(&input.path().join("Trip_1.plist"), Value::Dictionary(dict));

        let extractor = SourceExtractor::new("bplist").unwrap();
        let mut copies = Vec::new();
        let SourceOutcome::Extracted(extraction) =
            extractor.extract(&source, scratch.path(), &mut copies).unwrap()
        else {
            panic!("expected extraction");
        };

        let fragment = scratch.path().join("Trip_1/binarytext/Trip_1binaryText1.txt");
        let image = scratch.path().join("Trip_1/output/Trip_1_output1.png");
        assert_eq!(extraction.fragments, vec![fragment.clone()]);
        assert_eq!(extraction.images, vec![image.clone()]);
        assert!(extraction.discarded.is_empty());

        assert!(fs::read_to_string(&fragment).unwrap().starts_with(r"b'\x89PNG\r\n\x1a\n"));
        assert_eq!(&fs::read(&image).unwrap()[..8], &PNG_SIGNATURE);
        assert_eq!(copies, vec![input.path().join("Trip_1.plist.bplist")]);
        assert!(copies[0].exists());
    }

    #[test]
    fn test_images_numbered_in_fragment_order() {
        let input = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();

        let mut short = PNG_SIGNATURE.to_vec();
        short.extend_from_slice(&[0x00, 0x82]);
        let value = Value::Array(vec![
            Value::Data(short.clone()),
            Value::Data(sample_png()),
            Value::Data(vec![0x01, 0x02]),
            Value::Data(sample_png()),
        ]);
        let source = write_plist(&input.path().join("Trip_2.plist"), value);

        let extractor = SourceExtractor::new("bplist").unwrap();
        let mut copies = Vec::new();
        let SourceOutcome::Extracted(extraction) =
            extractor.extract(&source, scratch.path(), &mut copies).unwrap()
        else {
            panic!("expected extraction");
        };

        assert_eq!(extraction.fragments.len(), 3);
        assert_eq!(extraction.images.len(), 3);

        let output_dir = scratch.path().join("Trip_2/output");
        let first = fs::read(output_dir.join("Trip_2_output1.png")).unwrap();
        assert_eq!(&first[..short.len()], short.as_slice());
        assert!(output_dir.join("Trip_2_output3.png").exists());
        assert!(!output_dir.join("Trip_2_output4.png").exists());
    }

    #[test]
    fn test_invalid_plist_is_skipped() {
        let input = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let path = input.path().join("Trip_3.jpg");
        fs::write(&path, b"\xff\xd8\xff\xe0 not a plist").unwrap();
        let source = SourceFile::new(path, 16);

        let extractor = SourceExtractor::new("bplist").unwrap();
        let mut copies = Vec::new();
        let outcome = extractor.extract(&source, scratch.path(), &mut copies).unwrap();

        match outcome {
            SourceOutcome::Skipped { reason } => assert!(reason.starts_with("Invalid file")),
            other => panic!("expected skip, got {:?}", other),
        }
        assert!(!scratch.path().join("Trip_3").exists());
        assert_eq!(copies, vec![input.path().join("Trip_3.jpg.bplist")]);
    }

    #[test]
    fn test_source_named_like_a_copy() {
        let input = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let source = write_plist(
            &input.path().join("photos.bplist"),
            Value::Array(vec![Value::Data(sample_png())]),
        );

        let extractor = SourceExtractor::new("bplist").unwrap();
        let mut copies = Vec::new();
        let SourceOutcome::Extracted(extraction) =
            extractor.extract(&source, scratch.path(), &mut copies).unwrap()
        else {
            panic!("expected extraction");
        };

        assert_eq!(copies, vec![input.path().join("photos.bplist.bplist")]);
        assert_eq!(
            extraction.images,
            vec![scratch.path().join("photos/output/photos_output1.png")]
        );
        assert!(source.path.exists());
    }

    #[test]
    fn test_plist_without_images() {
        let input = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let source = write_plist(
            &input.path().join("Trip_4.plist"),
            Value::Array(vec![Value::Data(vec![1, 2, 3]), Value::Boolean(false)]),
        );

        let extractor = SourceExtractor::new("bplist").unwrap();
        let mut copies = Vec::new();
        let SourceOutcome::Extracted(extraction) =
            extractor.extract(&source, scratch.path(), &mut copies).unwrap()
        else {
            panic!("expected extraction");
        };

        assert!(extraction.fragments.is_empty());
        assert!(extraction.images.is_empty());
        assert!(scratch.path().join("Trip_4/output").is_dir());
    }

    #[test]
    fn test_progress_tracking() {
        let mut progress = ExtractionProgress::new(10, 1000);

        assert_eq!(progress.percentage(), 0.0);

        progress.update_file("Trip_1.plist".to_string(), 100, 2);
        assert_eq!(progress.percentage(), 10.0);
        assert_eq!(progress.bytes_processed, 100);
        assert_eq!(progress.images_recovered, 2);
        assert_eq!(progress.current_file.as_deref(), Some("Trip_1.plist"));
    }
}
