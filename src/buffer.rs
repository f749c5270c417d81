use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Line separator a target file is split and rejoined with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparator {
    #[default]
    Lf,
    Crlf,
}

impl LineSeparator {
    pub fn as_str(self) -> &'static str {
        match self {
            LineSeparator::Lf => "\n",
            LineSeparator::Crlf => "\r\n",
        }
    }
}

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Failed to locate {0}")]
    Missing(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8: {source}")]
    Utf8 {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl BufferError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            BufferError::Missing(path.to_path_buf())
        } else {
            BufferError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// How rewritten buffers reach the disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Compute and report changes without touching any file
    pub dry_run: bool,
    /// Keep before/after text on `Patched` outcomes for diff display
    pub keep_diff: bool,
}

/// Before/after text of a patched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub before: String,
    pub after: String,
}

/// Per-file result of a patch step.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be reported"]
pub enum PatchOutcome {
    /// File content changed and was written (or would be, in a dry run)
    Patched {
        file: PathBuf,
        change: Option<Box<TextChange>>,
    },
    /// File did not exist and was created
    Created { file: PathBuf },
    /// Rewrite produced identical bytes; nothing written
    Skipped { file: PathBuf },
    /// Target file is absent
    Missing { file: PathBuf },
    /// Orphaned mirror entry removed
    Deleted { file: PathBuf },
}

impl PatchOutcome {
    pub fn file(&self) -> &Path {
        match self {
            PatchOutcome::Patched { file, .. }
            | PatchOutcome::Created { file }
            | PatchOutcome::Skipped { file }
            | PatchOutcome::Missing { file }
            | PatchOutcome::Deleted { file } => file,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PatchOutcome::Skipped { .. })
    }

    /// Log the outcome the way every line patcher reports its files.
    pub fn log(&self) {
        match self {
            PatchOutcome::Patched { file, .. } => log::info!("Patched {}.", file.display()),
            PatchOutcome::Created { file } => log::info!("Created {}.", file.display()),
            PatchOutcome::Skipped { file } => log::warn!("Skipped {}.", file.display()),
            PatchOutcome::Missing { file } => log::error!("Failed to locate {}.", file.display()),
            PatchOutcome::Deleted { file } => log::info!("{} is deleted.", file.display()),
        }
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOutcome::Patched { file, .. } => write!(f, "Patched {}", file.display()),
            PatchOutcome::Created { file } => write!(f, "Created {}", file.display()),
            PatchOutcome::Skipped { file } => write!(f, "Skipped {}", file.display()),
            PatchOutcome::Missing { file } => write!(f, "Missing {}", file.display()),
            PatchOutcome::Deleted { file } => write!(f, "Deleted {}", file.display()),
        }
    }
}

/// A target file decoded into text, remembering its original bytes.
///
/// Patchers transform [`FileBuffer::text`] with a pure function and hand the
/// result to [`FileBuffer::commit`], which writes only when the bytes differ.
#[derive(Debug, Clone)]
pub struct FileBuffer {
    path: PathBuf,
    original: Vec<u8>,
    text: String,
}

impl FileBuffer {
    pub fn read(path: impl Into<PathBuf>) -> Result<Self, BufferError> {
        let path = path.into();
        let original = fs::read(&path).map_err(|e| BufferError::io(&path, e))?;
        let text = String::from_utf8(original.clone()).map_err(|source| BufferError::Utf8 {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            original,
            text,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn commit(&self, new_text: &str, options: WriteOptions) -> Result<PatchOutcome, BufferError> {
        write_if_changed(&self.path, Some(&self.original), new_text.as_bytes(), options)
    }
}

/// Write `new` to `path` unless it equals `original` byte for byte.
///
/// `original` is `None` when the file does not exist yet.
pub fn write_if_changed(
    path: &Path,
    original: Option<&[u8]>,
    new: &[u8],
    options: WriteOptions,
) -> Result<PatchOutcome, BufferError> {
    let file = path.to_path_buf();
    match original {
        Some(before) if before == new => return Ok(PatchOutcome::Skipped { file }),
        None => {
            if !options.dry_run {
                atomic_write(path, new)?;
            }
            return Ok(PatchOutcome::Created { file });
        }
        Some(_) => {}
    }

    let change = if options.keep_diff {
        original.map(|before| {
            Box::new(TextChange {
                before: String::from_utf8_lossy(before).into_owned(),
                after: String::from_utf8_lossy(new).into_owned(),
            })
        })
    } else {
        None
    };

    if !options.dry_run {
        atomic_write(path, new)?;
    }

    Ok(PatchOutcome::Patched { file, change })
}

/// Read a file that may legitimately be absent.
pub fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, BufferError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BufferError::io(path, e)),
    }
}

/// Atomic file write: tempfile + fsync + rename, then bump mtime.
///
/// make and ninja decide what to rebuild from mtimes, so a patched fragment
/// must always look newer than its outputs.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), BufferError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let wrap = |source: std::io::Error| BufferError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(wrap)?;
    temp.write_all(content).map_err(wrap)?;
    temp.as_file().sync_all().map_err(wrap)?;
    temp.persist(path).map_err(|e| wrap(e.error))?;

    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now).map_err(wrap)?;

    Ok(())
}
