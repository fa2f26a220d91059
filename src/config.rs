use crate::error::{PlistPngError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub recovery: RecoveryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root holding one folder per album
    pub input_dir: PathBuf,
    /// Root for per-album scratch directories
    pub scratch_dir: PathBuf,
    /// Root receiving the flat album folders
    pub album_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Extension appended to the sibling copy that gets decoded
    pub copy_extension: String,
    pub rename_sources: bool,
    pub max_file_size: u64,
    pub exclude_patterns: Vec<String>,
    pub skip_hidden: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub generate_report: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            scratch_dir: PathBuf::from("output"),
            album_dir: PathBuf::from("album"),
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            copy_extension: "bplist".to_string(),
            rename_sources: true,
            max_file_size: 512 * 1024 * 1024, // 512MB
            exclude_patterns: Vec::new(),
            skip_hidden: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            generate_report: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PlistPngError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PlistPngError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| PlistPngError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["plistpng.toml", ".plistpng.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref input_dir) = cli_args.input_dir {
            self.paths.input_dir = input_dir.clone();
        }

        if let Some(ref scratch_dir) = cli_args.scratch_dir {
            self.paths.scratch_dir = scratch_dir.clone();
        }

        if let Some(ref album_dir) = cli_args.album_dir {
            self.paths.album_dir = album_dir.clone();
        }

        if let Some(rename) = cli_args.rename_sources {
            self.recovery.rename_sources = rename;
        }

        if let Some(max_size) = cli_args.max_file_size {
            self.recovery.max_file_size = max_size;
        }

        if let Some(ref exclude) = cli_args.exclude_patterns {
            self.recovery.exclude_patterns.extend(exclude.clone());
        }

        if let Some(report) = cli_args.generate_report {
            self.output.generate_report = report;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| PlistPngError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| PlistPngError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let roots = [
            ("input", &self.paths.input_dir),
            ("scratch", &self.paths.scratch_dir),
            ("album", &self.paths.album_dir),
        ];
        for (name, root) in roots {
            if root.as_os_str().is_empty() {
                return Err(PlistPngError::Config {
                    message: format!("The {} directory must not be empty", name),
                });
            }
        }

        // Albums are written as direct children of the album root, so sharing
        // the input root would turn every album into a new input folder.
        if self.paths.album_dir == self.paths.input_dir {
            return Err(PlistPngError::Config {
                message: "Album directory must differ from the input directory".to_string(),
            });
        }

        let ext = &self.recovery.copy_extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
            return Err(PlistPngError::Config {
                message: format!(
                    "Copy extension must be a bare extension such as 'bplist', got '{}'",
                    ext
                ),
            });
        }

        if self.recovery.max_file_size == 0 {
            return Err(PlistPngError::Config {
                message: "Maximum file size must be greater than 0".to_string(),
            });
        }

        for pattern in &self.recovery.exclude_patterns {
            Regex::new(pattern).map_err(|e| PlistPngError::Config {
                message: format!("Invalid exclude pattern '{}': {}", pattern, e),
            })?;
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub input_dir: Option<PathBuf>,
    pub scratch_dir: Option<PathBuf>,
    pub album_dir: Option<PathBuf>,
    pub rename_sources: Option<bool>,
    pub max_file_size: Option<u64>,
    pub exclude_patterns: Option<Vec<String>>,
    pub generate_report: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_dir(mut self, input_dir: Option<PathBuf>) -> Self {
        self.input_dir = input_dir;
        self
    }

    pub fn with_scratch_dir(mut self, scratch_dir: Option<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir;
        self
    }

    pub fn with_album_dir(mut self, album_dir: Option<PathBuf>) -> Self {
        self.album_dir = album_dir;
        self
    }

    pub fn with_rename_sources(mut self, rename: Option<bool>) -> Self {
        self.rename_sources = rename;
        self
    }

    pub fn with_max_file_size(mut self, max_size: Option<u64>) -> Self {
        self.max_file_size = max_size;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Option<Vec<String>>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_generate_report(mut self, report: Option<bool>) -> Self {
        self.generate_report = report;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.paths.input_dir, PathBuf::from("input"));
        assert_eq!(config.paths.scratch_dir, PathBuf::from("output"));
        assert_eq!(config.paths.album_dir, PathBuf::from("album"));
        assert_eq!(config.recovery.copy_extension, "bplist");
        assert!(config.recovery.rename_sources);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.recovery.copy_extension = ".bplist".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.paths.album_dir = config.paths.input_dir.clone();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.recovery.exclude_patterns.push("(unclosed".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.recovery.max_file_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = Config::default();
        config.recovery.copy_extension = "plistcopy".to_string();
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config.recovery.copy_extension, "plistcopy");
        assert_eq!(loaded_config.paths.album_dir, config.paths.album_dir);
    }

    #[test]
    fn test_partial_config_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[paths]\nalbum_dir = \"recovered\"\n").unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.paths.album_dir, PathBuf::from("recovered"));
        assert_eq!(config.paths.input_dir, PathBuf::from("input"));
        assert_eq!(config.recovery.copy_extension, "bplist");
        assert!(config.recovery.rename_sources);
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::load_from_file("/definitely/not/here/plistpng.toml");
        assert!(matches!(result, Err(PlistPngError::Config { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_input_dir(Some(PathBuf::from("photos")))
            .with_rename_sources(Some(false))
            .with_exclude_patterns(Some(vec![r"\.DS_Store$".to_string()]));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.paths.input_dir, PathBuf::from("photos"));
        assert_eq!(config.paths.album_dir, PathBuf::from("album"));
        assert!(!config.recovery.rename_sources);
        assert_eq!(config.recovery.exclude_patterns, vec![r"\.DS_Store$"]);
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_file = NamedTempFile::new().unwrap();
        Config::default().save_to_file(temp_file.path()).unwrap();

        let sample = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(sample.contains("[paths]"));
        assert!(sample.contains("[recovery]"));
        assert!(sample.contains("[output]"));
    }
}
