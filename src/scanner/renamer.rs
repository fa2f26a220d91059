use crate::error::{PlistPngError, Result};
use crate::scanner::album_scanner::SourceFile;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const STAGING_PREFIX: &str = ".plistpng-rename-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl RenamePlan {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Renames the files of one folder to `<prefix>_<index>.<ext>`.
///
/// Indices are 1-based positions in the order the sources were listed; the
/// listing order of the file system is not sorted, so neither is the
/// numbering. Extensions are kept as-is and a file without one gets none.
pub struct Renamer {
    prefix: String,
}

impl Renamer {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn target_name(&self, index: usize, original: &Path) -> String {
        match original.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}_{}.{}", self.prefix, index, ext),
            None => format!("{}_{}", self.prefix, index),
        }
    }

    pub fn plan(&self, sources: &[SourceFile]) -> Vec<RenamePlan> {
        sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let parent = source.path.parent().unwrap_or_else(|| Path::new(""));
                RenamePlan {
                    from: source.path.clone(),
                    to: parent.join(self.target_name(i + 1, &source.path)),
                }
            })
            .collect()
    }

    /// Applies `plans` inside `dir` in two phases. Every source is first
    /// moved to a hidden sibling name, then to its target, so a target name
    /// still held by a later source is never overwritten. When any rename
    /// fails, the files already moved are put back under their old names.
    pub fn apply(&self, dir: &Path, plans: &[RenamePlan]) -> Result<()> {
        let pending: Vec<&RenamePlan> = plans.iter().filter(|p| !p.is_noop()).collect();
        if pending.is_empty() {
            return Ok(());
        }

        let sources: HashSet<&Path> = plans.iter().map(|p| p.from.as_path()).collect();
        for plan in &pending {
            if plan.to.exists() && !sources.contains(plan.to.as_path()) {
                return Err(PlistPngError::InvalidPath {
                    path: format!(
                        "Rename target already exists and is not part of the album: {}",
                        plan.to.display()
                    ),
                });
            }
        }

        let mut staged: Vec<(&RenamePlan, PathBuf)> = Vec::with_capacity(pending.len());
        for (index, plan) in pending.iter().copied().enumerate() {
            let staged_path = match staging_path(dir, index, &plan.from) {
                Ok(path) => path,
                Err(e) => {
                    roll_back(&staged, 0);
                    return Err(e);
                }
            };

            if let Err(e) = fs::rename(&plan.from, &staged_path) {
                roll_back(&staged, 0);
                return Err(e.into());
            }
            staged.push((plan, staged_path));
        }

        for (placed, (plan, staged_path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(staged_path, &plan.to) {
                roll_back(&staged, placed);
                return Err(e.into());
            }
        }

        Ok(())
    }

    /// Renames every source and returns them under their new names together
    /// with the renames that actually moved a file.
    pub fn rename_sources(
        &self,
        dir: &Path,
        sources: Vec<SourceFile>,
    ) -> Result<(Vec<SourceFile>, Vec<RenamePlan>)> {
        let plans = self.plan(&sources);
        self.apply(dir, &plans)?;

        let renamed = sources
            .into_iter()
            .zip(&plans)
            .map(|(source, plan)| SourceFile::new(plan.to.clone(), source.size))
            .collect();

        let moved = plans.into_iter().filter(|p| !p.is_noop()).collect();

        Ok((renamed, moved))
    }
}

/// A hidden name next to `from` that nothing holds yet. The original file
/// name is kept in it so a run killed mid-rename leaves a recognisable file.
fn staging_path(dir: &Path, index: usize, from: &Path) -> Result<PathBuf> {
    let original = from
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    for attempt in 0..100 {
        let candidate = dir.join(format!(
            "{}{}-{}-{}",
            STAGING_PREFIX, index, attempt, original
        ));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(PlistPngError::InvalidPath {
        path: format!("No free staging name for {}", from.display()),
    })
}

/// Undoes a partial `apply`: the first `placed` entries already sit at their
/// targets, the rest at their staging names. Best effort; a file that cannot
/// be moved back keeps whichever name it has.
fn roll_back(staged: &[(&RenamePlan, PathBuf)], placed: usize) {
    for (plan, staged_path) in staged[..placed].iter().rev() {
        let _ = fs::rename(&plan.to, staged_path);
    }
    for (plan, staged_path) in staged.iter().rev() {
        let _ = fs::rename(staged_path, &plan.from);
    }
}
