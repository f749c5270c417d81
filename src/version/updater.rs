//! Version updater: rewrites the `version` capture of every matching line.
//!
//! For each target file the updater:
//! - splits the file by the target's declared line separator
//! - tries the target's patterns in order; the first match wins for a line
//! - replaces only the span captured by the `version` group
//! - writes the file back only when the bytes changed

use crate::buffer::{BufferError, FileBuffer, PatchOutcome, WriteOptions};
use crate::config::{Target, TargetSet, VERSION_GROUP};
use crate::error::PatchError;
use crate::safety::TreeGuard;
use crate::version::Version;
use log::{error, info, warn};

/// A single version substitution inside a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// 1-based line number
    pub line_number: usize,
    pub old: String,
    pub new: String,
}

/// Result of running one target's patterns over a whole buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    pub replacements: Vec<Replacement>,
}

/// A rewritten line plus the span that changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub text: String,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, Copy)]
pub struct VersionUpdater<'a> {
    version: &'a Version,
    targets: &'a [Target],
}

impl<'a> VersionUpdater<'a> {
    pub fn new(version: &'a Version, targets: &'a [Target]) -> Self {
        Self { version, targets }
    }

    pub fn from_set(set: &'a TargetSet) -> Self {
        Self::new(&set.version, &set.targets)
    }

    /// Rewrite one line with the first of `target`'s patterns that matches it.
    pub fn apply_line(&self, target: &Target, line: &str) -> Option<LineEdit> {
        for pattern in &target.patterns {
            let Some(captures) = pattern.captures(line) else {
                continue;
            };
            // Every pattern is checked for the group at load time.
            let Some(span) = captures.name(VERSION_GROUP) else {
                continue;
            };

            let old = span.as_str();
            let new = self.version.spelled_like(old);
            let mut text = String::with_capacity(line.len() + new.len());
            text.push_str(&line[..span.start()]);
            text.push_str(&new);
            text.push_str(&line[span.end()..]);

            return Some(LineEdit {
                text,
                old: old.to_string(),
                new,
            });
        }
        None
    }

    /// Rewrite a whole buffer split by `target`'s separator.
    pub fn apply(&self, target: &Target, content: &str) -> Rewrite {
        let separator = target.separator.as_str();
        let mut lines = Vec::new();
        let mut replacements = Vec::new();

        for (idx, line) in content.split(separator).enumerate() {
            match self.apply_line(target, line) {
                Some(edit) => {
                    replacements.push(Replacement {
                        line_number: idx + 1,
                        old: edit.old,
                        new: edit.new,
                    });
                    lines.push(edit.text);
                }
                None => lines.push(line.to_string()),
            }
        }

        Rewrite {
            content: lines.join(separator),
            replacements,
        }
    }

    /// Update every target under the guarded tree.
    ///
    /// Missing files are reported as [`PatchOutcome::Missing`] and do not stop
    /// the remaining targets.
    pub fn update(
        &self,
        tree: &TreeGuard,
        options: WriteOptions,
    ) -> Result<Vec<PatchOutcome>, PatchError> {
        let mut outcomes = Vec::with_capacity(self.targets.len());

        for target in self.targets {
            let path = tree.resolve(&target.file)?;
            info!("Updating {}.", path.display());

            let buffer = match FileBuffer::read(&path) {
                Ok(buffer) => buffer,
                Err(BufferError::Missing(file)) => {
                    error!("  Failed to locate {}.", file.display());
                    outcomes.push(PatchOutcome::Missing { file });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let rewrite = self.apply(target, buffer.text());
            for replacement in &rewrite.replacements {
                info!(
                    "  {}: {} -> {}",
                    replacement.line_number, replacement.old, replacement.new
                );
            }

            let outcome = buffer.commit(&rewrite.content, options)?;
            if outcome.is_skipped() {
                warn!("  Skipped.");
            } else {
                info!("  Updated.");
            }
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
