pub mod cleaner;
pub mod collector;
pub mod file_extractor;
pub mod image_recoverer;
pub mod loader;
pub mod output_manager;
pub mod text_dump;

pub use cleaner::Cleaner;
pub use collector::AlbumCollector;
pub use file_extractor::{ExtractionProgress, SourceExtraction, SourceExtractor, SourceOutcome};
pub use image_recoverer::{decode_escaped, has_png_signature, ImageRecoverer, RecoveryOutcome};
pub use loader::PlistLoader;
pub use output_manager::{AlbumReport, ConfigSnapshot, OutputManager, RecoveryReport};
pub use text_dump::{render_value, FragmentMatcher, PNG_SIGNATURE};
