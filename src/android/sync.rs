use super::transform::transform_source;
use crate::buffer::{read_optional, write_if_changed, FileBuffer, PatchOutcome, WriteOptions};
use crate::error::PatchError;
use crate::safety::TreeGuard;
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Canonical Java tree, relative to the repository root.
pub const SOURCE_DIR: &str = "src/main/java/com/caoccao/javet";
/// Android mirror of [`SOURCE_DIR`].
pub const MIRROR_DIR: &str = "android/javet-android/src/main/java/com/caoccao/javet";

/// Relative directory and file paths under one root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeListing {
    pub dirs: BTreeSet<PathBuf>,
    pub files: BTreeSet<PathBuf>,
}

impl TreeListing {
    /// List everything below `root`. An absent root lists as empty.
    pub fn scan(root: &Path) -> Result<Self, PatchError> {
        let mut listing = TreeListing::default();
        if !root.is_dir() {
            return Ok(listing);
        }

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| PatchError::walk(root, e))?;
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if entry.file_type().is_dir() {
                listing.dirs.insert(relative.to_path_buf());
            } else if entry.file_type().is_file() {
                listing.files.insert(relative.to_path_buf());
            }
        }
        Ok(listing)
    }
}

/// Mirror entries with no counterpart in the source tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrunePlan {
    /// Top-most orphaned directories, removed recursively
    pub dirs: Vec<PathBuf>,
    /// Orphaned files outside those directories
    pub files: Vec<PathBuf>,
}

impl PrunePlan {
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    /// Split off the entries whose path the source holds as the other kind.
    ///
    /// These block the forward copy (a directory where a file must land, or
    /// a file where a directory must be created), so they go first.
    pub fn take_conflicts(&mut self, source: &TreeListing) -> PrunePlan {
        let (conflict_dirs, dirs): (Vec<PathBuf>, Vec<PathBuf>) = self
            .dirs
            .drain(..)
            .partition(|dir| source.files.contains(dir));
        let (conflict_files, files): (Vec<PathBuf>, Vec<PathBuf>) = self
            .files
            .drain(..)
            .partition(|file| source.dirs.contains(file));
        self.dirs = dirs;
        self.files = files;
        PrunePlan {
            dirs: conflict_dirs,
            files: conflict_files,
        }
    }

    /// Whether `relative` is one of the planned entries or lies below one.
    pub fn covers(&self, relative: &Path) -> bool {
        self.dirs
            .iter()
            .chain(&self.files)
            .any(|entry| relative.starts_with(entry))
    }
}

/// Set difference `mirror - source`, by kind.
///
/// A mirror directory is orphaned when the source has no directory at that
/// path; a mirror file when the source has no file there. Entries below an
/// orphaned directory are covered by its recursive removal and left out.
pub fn plan_prune(source: &TreeListing, mirror: &TreeListing) -> PrunePlan {
    let mut plan = PrunePlan::default();

    for dir in mirror.dirs.difference(&source.dirs) {
        if !plan.dirs.iter().any(|pruned| dir.starts_with(pruned)) {
            plan.dirs.push(dir.clone());
        }
    }

    for file in mirror.files.difference(&source.files) {
        if !plan.dirs.iter().any(|pruned| file.starts_with(pruned)) {
            plan.files.push(file.clone());
        }
    }

    plan
}

/// Keeps the Android mirror in step with the canonical sources.
pub struct AndroidMirror {
    tree: TreeGuard,
    options: WriteOptions,
}

impl AndroidMirror {
    pub fn new(tree: TreeGuard, options: WriteOptions) -> Self {
        Self { tree, options }
    }

    /// Copy transformed sources into the mirror, then prune orphans.
    ///
    /// Mirror entries of the wrong kind are removed before the copy so the
    /// source layout can be written over them.
    pub fn sync(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        info!("Patch Android Build");
        let source = self.tree.resolve(SOURCE_DIR)?;
        if !source.is_dir() {
            return Err(PatchError::MissingSourceDir(source));
        }

        let mirror = self.tree.resolve(MIRROR_DIR)?;
        if !mirror.exists() && !self.options.dry_run {
            fs::create_dir_all(&mirror).map_err(|e| PatchError::io(&mirror, e))?;
            info!("{} is created.", mirror.display());
        }
        info!("From {}", source.display());
        info!("  To {}", mirror.display());

        let source_listing = TreeListing::scan(&source)?;
        let mirror_listing = TreeListing::scan(&mirror)?;
        let mut plan = plan_prune(&source_listing, &mirror_listing);
        let conflicts = plan.take_conflicts(&source_listing);

        let mut outcomes = self.prune(&mirror, &conflicts)?;
        outcomes.extend(self.copy_forward(&source, &mirror, &source_listing, &conflicts)?);
        outcomes.extend(self.prune(&mirror, &plan)?);
        Ok(outcomes)
    }

    fn copy_forward(
        &self,
        source: &Path,
        mirror: &Path,
        listing: &TreeListing,
        cleared: &PrunePlan,
    ) -> Result<Vec<PatchOutcome>, PatchError> {
        let mut outcomes = Vec::with_capacity(listing.files.len());
        for relative in &listing.files {
            let buffer = FileBuffer::read(source.join(relative))?;
            let content = transform_source(buffer.text());

            let target = self.tree.resolve(mirror.join(relative))?;
            if let Some(parent) = target.parent() {
                if !parent.exists() && !self.options.dry_run {
                    fs::create_dir_all(parent).map_err(|e| PatchError::io(parent, e))?;
                    info!("{} is created.", parent.display());
                }
            }

            // A dry run leaves conflicting entries in place; treat them as gone.
            let original = if self.options.dry_run && cleared.covers(relative) {
                None
            } else {
                read_optional(&target)?
            };
            let outcome =
                write_if_changed(&target, original.as_deref(), content.as_bytes(), self.options)?;
            if outcome.is_skipped() {
                debug!("{} is up to date.", target.display());
            } else {
                info!("{} is copied.", target.display());
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn prune(&self, mirror: &Path, plan: &PrunePlan) -> Result<Vec<PatchOutcome>, PatchError> {
        let mut outcomes = Vec::new();

        for dir in &plan.dirs {
            let path = self.tree.revalidate(&mirror.join(dir))?;
            if !self.options.dry_run {
                fs::remove_dir_all(&path).map_err(|e| PatchError::io(&path, e))?;
            }
            let outcome = PatchOutcome::Deleted { file: path };
            outcome.log();
            outcomes.push(outcome);
        }

        for file in &plan.files {
            let path = self.tree.revalidate(&mirror.join(file))?;
            if !self.options.dry_run {
                fs::remove_file(&path).map_err(|e| PatchError::io(&path, e))?;
            }
            let outcome = PatchOutcome::Deleted { file: path };
            outcome.log();
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
