pub mod album_scanner;
pub mod file_filter;
pub mod renamer;

pub use album_scanner::{Album, AlbumScanner, ScanStatistics, SourceFile};
pub use file_filter::SourceFilter;
pub use renamer::{RenamePlan, Renamer};
