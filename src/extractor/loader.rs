use crate::error::{PlistPngError, Result};
use plist::Value;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const MAX_COPY_ATTEMPTS: usize = 100;

/// Copies a source next to itself with an extra extension and decodes that
/// copy as a property list.
pub struct PlistLoader {
    copy_extension: String,
}

impl PlistLoader {
    pub fn new<S: Into<String>>(copy_extension: S) -> Self {
        Self {
            copy_extension: copy_extension.into(),
        }
    }

    /// `<source>.<ext>` on the first attempt, `<source>.<attempt>.<ext>`
    /// after that. The extension is appended, never substituted.
    fn copy_path(&self, source: &Path, attempt: usize) -> PathBuf {
        let mut name = OsString::from(source.as_os_str());
        if attempt > 0 {
            name.push(format!(".{}", attempt));
        }
        name.push(".");
        name.push(&self.copy_extension);
        PathBuf::from(name)
    }

    /// Writes the copy under a name nothing else holds yet, so an existing
    /// file in the album is never overwritten. The returned path is the only
    /// one cleanup may delete.
    pub fn create_copy(&self, source: &Path) -> Result<PathBuf> {
        let mut reader = fs::File::open(source)?;

        for attempt in 0..MAX_COPY_ATTEMPTS {
            let copy_path = self.copy_path(source, attempt);
            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&copy_path)
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = io::copy(&mut reader, &mut file) {
                drop(file);
                let _ = fs::remove_file(&copy_path);
                return Err(e.into());
            }

            return Ok(copy_path);
        }

        Err(PlistPngError::InvalidPath {
            path: format!("No free name for a decode copy of {}", source.display()),
        })
    }

    /// Decode failures come back as `InvalidPlist` so the caller can skip the
    /// file; I/O failures while opening stay `Io`.
    pub fn decode(&self, path: &Path) -> Result<Value> {
        let file = fs::File::open(path)?;
        Value::from_reader(file).map_err(|source| PlistPngError::InvalidPlist {
            path: path.display().to_string(),
            source,
        })
    }
}

impl Default for PlistLoader {
    fn default() -> Self {
        Self::new("bplist")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::Dictionary;
    use tempfile::TempDir;

    #[test]
    fn test_copy_path_appends_extension() {
        let loader = PlistLoader::default();

        assert_eq!(
            loader.copy_path(Path::new("input/Trip/Trip_1.plist"), 0),
            PathBuf::from("input/Trip/Trip_1.plist.bplist")
        );
        assert_eq!(
            loader.copy_path(Path::new("Trip_2"), 0),
            PathBuf::from("Trip_2.bplist")
        );
        assert_eq!(
            loader.copy_path(Path::new("Trip_2"), 3),
            PathBuf::from("Trip_2.3.bplist")
        );
    }

    #[test]
    fn test_copy_and_decode_binary_plist() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Trip_1");

        let mut dict = Dictionary::new();
        dict.insert("name".to_string(), Value::String("beach".to_string()));
        dict.insert("blob".to_string(), Value::Data(vec![1, 2, 3]));
        Value::Dictionary(dict).to_file_binary(&source).unwrap();

        let loader = PlistLoader::default();
        let copy_path = loader.create_copy(&source).unwrap();
        let value = loader.decode(&copy_path).unwrap();

        assert_eq!(copy_path, temp_dir.path().join("Trip_1.bplist"));
        assert_eq!(fs::read(&copy_path).unwrap(), fs::read(&source).unwrap());
        let dict = value.as_dictionary().unwrap();
        assert_eq!(dict.get("blob").and_then(Value::as_data), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_copy_never_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("photos");
        let neighbour = temp_dir.path().join("photos.bplist");
        fs::write(&source, b"source bytes").unwrap();
        fs::write(&neighbour, b"another album file").unwrap();

        let loader = PlistLoader::default();
        let copy_path = loader.create_copy(&source).unwrap();

        assert_eq!(copy_path, temp_dir.path().join("photos.1.bplist"));
        assert_eq!(fs::read(&copy_path).unwrap(), b"source bytes");
        assert_eq!(fs::read(&neighbour).unwrap(), b"another album file");
    }

    #[test]
    fn test_decode_invalid_plist() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("notes.txt");
        fs::write(&source, b"\x00\xff\x10{ not a property list").unwrap();

        let loader = PlistLoader::default();
        let copy_path = loader.create_copy(&source).unwrap();
        let result = loader.decode(&copy_path);

        assert!(matches!(result, Err(PlistPngError::InvalidPlist { .. })));
        assert!(copy_path.exists());
    }
}
