use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlistPngError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Property list could not be decoded: {path}")]
    InvalidPlist {
        path: String,
        #[source]
        source: plist::Error,
    },

    #[error("Malformed fragment: {reason}")]
    MalformedFragment { reason: String },

    #[error("No album folders found in {input_dir}")]
    NoAlbumsFound { input_dir: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid fragment pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Permission denied: {path}")]
    Permission { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,

    #[error("File too large: {size} bytes (max: {max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for PlistPngError {
    fn user_message(&self) -> String {
        match self {
            PlistPngError::InvalidPlist { path, source } => {
                format!("Not a valid property list: {} ({})", path, source)
            }
            PlistPngError::MalformedFragment { reason } => {
                format!("Fragment could not be decoded: {}", reason)
            }
            PlistPngError::NoAlbumsFound { input_dir } => {
                format!("No album folders found in: {}", input_dir)
            }
            PlistPngError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            PlistPngError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            PlistPngError::Cancelled => "Operation was cancelled by user".to_string(),
            PlistPngError::FileTooLarge { size, max_size } => {
                format!(
                    "File too large: {} (maximum allowed: {})",
                    format_bytes(*size),
                    format_bytes(*max_size)
                )
            }
            PlistPngError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            PlistPngError::NoAlbumsFound { .. } => Some(
                "Place each set of property-list files in its own folder inside the input directory (e.g., input/Holiday/...).".to_string()
            ),
            PlistPngError::Config { .. } => Some(
                "Check your configuration file syntax or regenerate one with --generate-config.".to_string()
            ),
            PlistPngError::Permission { .. } => Some(
                "Ensure you have read/write permissions for the input, scratch and album directories.".to_string()
            ),
            PlistPngError::FileTooLarge { .. } => Some(
                "Increase the maximum source file size with --max-size.".to_string()
            ),
            PlistPngError::InvalidPath { .. } => Some(
                "Pass an existing input directory as the first argument or set paths.input_dir in the config file.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for PlistPngError {
    fn from(error: toml::de::Error) -> Self {
        PlistPngError::Config {
            message: error.to_string(),
        }
    }
}

impl From<walkdir::Error> for PlistPngError {
    fn from(error: walkdir::Error) -> Self {
        let path = error
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let kind = error.io_error().map(|e| e.kind());

        match kind {
            Some(std::io::ErrorKind::PermissionDenied) => PlistPngError::Permission { path },
            _ => PlistPngError::Io(error.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlistPngError>;

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = PlistPngError::NoAlbumsFound {
            input_dir: "input".to_string(),
        };
        assert!(error.user_message().contains("No album folders"));
        assert!(error.suggestion().is_some());

        assert!(PlistPngError::Cancelled.suggestion().is_none());
    }

    #[test]
    fn test_file_too_large_message() {
        let error = PlistPngError::FileTooLarge {
            size: 2048,
            max_size: 1024,
        };
        assert_eq!(
            error.user_message(),
            "File too large: 2.0 KB (maximum allowed: 1.0 KB)"
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(500), "500 B");
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let error = PlistPngError::from(toml_error);
        assert!(matches!(error, PlistPngError::Config { .. }));
    }
}
