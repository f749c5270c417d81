//! arm64 pointer authentication flags for Node.js builds.
//!
//! `configure.py` hard-codes `-msign-return-address=all`, which GCC 9 and
//! later reject in favor of `-mbranch-protection=standard`. The flag moves
//! into a `target_arch=="arm64"` condition in `node.gyp`, chosen by the GCC
//! major version of the build image.

use crate::buffer::{BufferError, FileBuffer, PatchOutcome, WriteOptions};
use crate::error::PatchError;
use crate::safety::TreeGuard;
use log::info;
use std::fmt;

pub const GCC_VERSION_VAR: &str = "GCC_MAJOR_VERSION";
pub const GYP_FILE: &str = "node.gyp";
pub const CONFIGURE_FILE: &str = "configure.py";
pub const CONFIGURE_LINE: &str = "    o['cflags']+=['-msign-return-address=all']";

const GYP_CONDITIONS_OPEN: &str = "'conditions': [";
const GYP_AIX_CONDITION: &str = "
      ['OS==\"aix\"', {
        'ldflags': [
          '-Wl,-bnoerrmsg',
        ],
      }],";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAuthFlag {
    /// `-msign-return-address=all`, GCC 8 and older
    SignReturnAddress,
    /// `-mbranch-protection=standard`, GCC 9 onward
    BranchProtection,
}

impl PointerAuthFlag {
    pub fn for_gcc(major: u32) -> Self {
        if major > 8 {
            PointerAuthFlag::BranchProtection
        } else {
            PointerAuthFlag::SignReturnAddress
        }
    }

    /// Pick the flag from `GCC_MAJOR_VERSION`.
    pub fn from_env() -> Result<Self, PatchError> {
        let raw = std::env::var(GCC_VERSION_VAR).map_err(|e| PatchError::Environment {
            name: GCC_VERSION_VAR,
            reason: e.to_string(),
        })?;
        Self::parse_major(&raw)
    }

    pub fn parse_major(raw: &str) -> Result<Self, PatchError> {
        let major = raw
            .trim()
            .parse::<u32>()
            .map_err(|e| PatchError::Environment {
                name: GCC_VERSION_VAR,
                reason: format!("{raw:?} is not a major version: {e}"),
            })?;
        info!("Detected {GCC_VERSION_VAR}={major}.");
        Ok(Self::for_gcc(major))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PointerAuthFlag::SignReturnAddress => "-msign-return-address=all",
            PointerAuthFlag::BranchProtection => "-mbranch-protection=standard",
        }
    }
}

impl fmt::Display for PointerAuthFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insert the arm64 condition ahead of the AIX ldflags condition.
///
/// Only the exact unpatched block is replaced, so a second run is a no-op.
pub fn patch_gyp_text(content: &str, flag: PointerAuthFlag) -> String {
    let from = format!("{GYP_CONDITIONS_OPEN}{GYP_AIX_CONDITION}");
    let to = format!(
        "{GYP_CONDITIONS_OPEN}
      ['target_arch==\"arm64\"', {{
        'cflags': ['{flag}'],  # Pointer authentication.
      }}],{GYP_AIX_CONDITION}"
    );
    content.replace(&from, &to)
}

/// Drop the hard-coded sign-return-address line from `configure.py`.
///
/// When the line after it is blank, the line before it goes too (it is the
/// `if` guarding the removed statement).
pub fn patch_configure_text(content: &str) -> String {
    let mut lines: Vec<&str> = content.split('\n').collect();
    let Some(idx) = lines.iter().position(|line| *line == CONFIGURE_LINE) else {
        return content.to_string();
    };

    lines.remove(idx);
    if idx > 0 && lines.get(idx).is_some_and(|line| line.is_empty()) {
        lines.remove(idx - 1);
    }
    lines.join("\n")
}

pub struct ArmFlagPatcher {
    tree: TreeGuard,
    flag: PointerAuthFlag,
    options: WriteOptions,
}

impl ArmFlagPatcher {
    pub fn new(tree: TreeGuard, flag: PointerAuthFlag, options: WriteOptions) -> Self {
        Self {
            tree,
            flag,
            options,
        }
    }

    pub fn patch(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        let flag = self.flag;
        Ok(vec![
            self.patch_file(GYP_FILE, |text| patch_gyp_text(text, flag))?,
            self.patch_file(CONFIGURE_FILE, patch_configure_text)?,
        ])
    }

    fn patch_file<F>(&self, relative: &str, transform: F) -> Result<PatchOutcome, PatchError>
    where
        F: Fn(&str) -> String,
    {
        let path = self.tree.resolve(relative)?;
        let outcome = match FileBuffer::read(&path) {
            Ok(buffer) => buffer.commit(&transform(buffer.text()), self.options)?,
            Err(BufferError::Missing(file)) => PatchOutcome::Missing { file },
            Err(e) => return Err(e.into()),
        };
        outcome.log();
        Ok(outcome)
    }
}
