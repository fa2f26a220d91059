use crate::error::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Removes the decode copies an album run created next to its sources.
///
/// Only paths handed back by `PlistLoader::create_copy` during the run are
/// touched; nothing is matched by name, so a source that happens to carry
/// the copy extension stays where it is.
pub struct Cleaner;

impl Cleaner {
    /// Deletes each of `copies` and returns the ones that were removed.
    /// Copies that are already gone are skipped.
    pub fn remove_plist_copies(copies: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::with_capacity(copies.len());

        for copy in copies {
            if remove_file(copy)? {
                removed.push(copy.clone());
            }
        }

        Ok(removed)
    }
}

fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
