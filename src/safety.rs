use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Keeps every read, write, and delete inside one build tree.
///
/// Target paths come from configuration, so a stray `..` or a symlink in a
/// checkout must not let a patch step edit files elsewhere on disk.
#[derive(Debug, Clone)]
pub struct TreeGuard {
    /// Canonical path to the tree root
    root: PathBuf,
    /// Canonical paths that are never edited (version control metadata)
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside the tree: {path} (root: {root})")]
    OutsideTree { path: PathBuf, root: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Tree root does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("Failed to canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TreeGuard {
    /// Create a guard rooted at `root`, which must exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(SafetyError::MissingRoot(root.to_path_buf()));
        }
        let root = canonicalize(root)?;

        let mut forbidden_paths = Vec::new();
        if let Ok(git_dir) = root.join(".git").canonicalize() {
            forbidden_paths.push(git_dir);
        }

        Ok(Self {
            root,
            forbidden_paths,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a tree-relative path.
    ///
    /// Existing paths are canonicalized (resolving symlinks) and checked.
    /// Paths that do not exist yet are normalized lexically, so callers can
    /// still report them as missing or create them.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let relative = relative.as_ref();
        let joined = if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root.join(relative)
        };

        if joined.exists() {
            let canonical = canonicalize(&joined)?;
            self.check(&canonical)?;
            return Ok(canonical);
        }

        let resolved = resolve_missing(&normalize(&joined))?;
        self.check(&resolved)?;
        Ok(resolved)
    }

    /// Re-check an already resolved path right before a destructive step.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = canonicalize(path)?;
        self.check(&canonical)?;
        Ok(canonical)
    }

    fn check(&self, path: &Path) -> Result<(), SafetyError> {
        if !path.starts_with(&self.root) {
            return Err(SafetyError::OutsideTree {
                path: path.to_path_buf(),
                root: self.root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if path.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: path.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn with_forbidden(
        root: impl AsRef<Path>,
        forbidden: Vec<PathBuf>,
    ) -> Result<Self, SafetyError> {
        let root = canonicalize(root.as_ref())?;
        Ok(Self {
            root,
            forbidden_paths: forbidden,
        })
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize()
        .map_err(|source| SafetyError::Canonicalize {
            path: path.to_path_buf(),
            source,
        })
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// components below it, so a symlinked parent directory cannot hide where a
/// new file lands.
fn resolve_missing(path: &Path) -> Result<PathBuf, SafetyError> {
    let mut tail = Vec::new();
    let mut ancestor = path;
    while !ancestor.exists() {
        let (Some(parent), Some(name)) = (ancestor.parent(), ancestor.file_name()) else {
            return Ok(path.to_path_buf());
        };
        tail.push(name);
        ancestor = parent;
    }

    let mut resolved = canonicalize(ancestor)?;
    for name in tail.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
