use crate::buffer::BufferError;
use crate::config::ConfigError;
use crate::gn::GnError;
use crate::platform::HostPlatform;
use crate::safety::SafetyError;
use crate::version::VersionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a patch step.
///
/// A missing target file is usually not one of these: steps report it as
/// [`crate::PatchOutcome::Missing`] and carry on with the next file.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Gn(#[from] GnError),

    #[error("{task} is for {required} only (host: {host})")]
    UnsupportedPlatform {
        task: &'static str,
        required: String,
        host: HostPlatform,
    },

    #[error("{0} is not found")]
    MissingSourceDir(PathBuf),

    #[error("environment variable {name}: {reason}")]
    Environment { name: &'static str, reason: String },

    #[error("invalid TOML in {path}: {message}")]
    Toml { path: PathBuf, message: String },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatchError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walk(path: impl Into<PathBuf>, source: walkdir::Error) -> Self {
        PatchError::Walk {
            path: path.into(),
            source,
        }
    }
}
