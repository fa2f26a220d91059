use crate::config::RecoveryConfig;
use regex::Regex;
use std::path::Path;

/// Decides which directory entries of an album folder count as source files.
pub struct SourceFilter {
    max_file_size: u64,
    exclude_patterns: Vec<Regex>,
    skip_hidden: bool,
}

impl SourceFilter {
    pub fn new(config: &RecoveryConfig) -> Self {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            max_file_size: config.max_file_size,
            exclude_patterns,
            skip_hidden: config.skip_hidden,
        }
    }

    /// Any file name counts, whatever its extension, unless it is hidden and
    /// hidden files are skipped or it matches an exclude pattern.
    pub fn is_source_file(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        if self.skip_hidden && filename.starts_with('.') {
            return false;
        }

        !self.matches_any_pattern(filename)
    }

    pub fn is_size_allowed(&self, size: u64) -> bool {
        size <= self.max_file_size
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::new(&RecoveryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> RecoveryConfig {
        RecoveryConfig {
            copy_extension: "bplist".to_string(),
            rename_sources: true,
            max_file_size: 1024,
            exclude_patterns: vec![r"^\.DS_Store$".to_string(), r"\.tmp$".to_string()],
            skip_hidden: false,
        }
    }

    #[test]
    fn test_source_file_detection() {
        let filter = SourceFilter::new(&create_test_config());

        assert!(filter.is_source_file(Path::new("Album_1.plist")));
        assert!(filter.is_source_file(Path::new("no_extension")));
        assert!(filter.is_source_file(Path::new(".hidden_state")));

        assert!(filter.is_source_file(Path::new("photos.bplist")));
        assert!(filter.is_source_file(Path::new("Album_1.plist.bplist")));
        assert!(!filter.is_source_file(Path::new(".DS_Store")));
        assert!(!filter.is_source_file(Path::new("scratch.tmp")));
    }

    #[test]
    fn test_skip_hidden() {
        let mut config = create_test_config();
        config.skip_hidden = true;
        let filter = SourceFilter::new(&config);

        assert!(!filter.is_source_file(Path::new(".hidden_state")));
        assert!(filter.is_source_file(Path::new("visible")));
    }

    #[test]
    fn test_size_limits() {
        let filter = SourceFilter::new(&create_test_config());

        assert!(filter.is_size_allowed(0));
        assert!(filter.is_size_allowed(1024));
        assert!(!filter.is_size_allowed(1025));
    }

    #[test]
    fn test_invalid_patterns_are_ignored() {
        let mut config = create_test_config();
        config.exclude_patterns = vec!["(unclosed".to_string()];
        let filter = SourceFilter::new(&config);

        assert!(filter.is_source_file(Path::new("(unclosed")));
    }
}
