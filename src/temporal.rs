//! Static library output for the temporal crates vendored by V8.
//!
//! V8 links `temporal_capi` into the monolith, which needs the crates to
//! build a `staticlib` next to the usual `rlib`.

use crate::buffer::{FileBuffer, PatchOutcome, WriteOptions};
use crate::error::PatchError;
use crate::safety::TreeGuard;
use log::warn;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use toml_edit::DocumentMut;

pub const MANIFESTS: [&str; 2] = ["Cargo.toml", "temporal_capi/Cargo.toml"];
pub const LIB_SECTION: &str = "\n[lib]\ncrate-type = [\"staticlib\", \"rlib\"]\n";

static PACKAGE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?miR)^[ \t]*\[package\][ \t]*(?:#.*)?$")
        .expect("hardcoded regex must compile")
});

/// Result of inspecting one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibSection {
    /// A `[lib]` table is already declared
    Present,
    /// No `[package]` table to attach one to
    NoPackage,
    /// New manifest text with the `[lib]` table inserted
    Inserted(String),
}

/// Insert [`LIB_SECTION`] at the end of the `[package]` table.
///
/// The section ends at the next table header or at end of file. The result
/// is parsed again so a malformed insertion never reaches the disk.
pub fn add_lib_section(path: &Path, content: &str) -> Result<LibSection, PatchError> {
    let document = parse(path, content)?;
    if document.contains_key("lib") {
        return Ok(LibSection::Present);
    }
    if !document.get("package").is_some_and(|item| item.is_table()) {
        return Ok(LibSection::NoPackage);
    }

    let Some(header) = PACKAGE_HEADER.find(content) else {
        // Dotted or inline `package` definitions have no header to anchor on.
        return Ok(LibSection::NoPackage);
    };
    let section_end = content[header.end()..]
        .find("\n[")
        .map_or(content.len(), |offset| header.end() + offset);

    let mut patched = String::with_capacity(content.len() + LIB_SECTION.len());
    patched.push_str(&content[..section_end]);
    patched.push_str(LIB_SECTION);
    patched.push_str(&content[section_end..]);

    parse(path, &patched)?;
    Ok(LibSection::Inserted(patched))
}

fn parse(path: &Path, content: &str) -> Result<DocumentMut, PatchError> {
    content
        .parse::<DocumentMut>()
        .map_err(|err| PatchError::Toml {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

pub struct TemporalPatcher {
    tree: TreeGuard,
    options: WriteOptions,
}

impl TemporalPatcher {
    pub fn new(tree: TreeGuard, options: WriteOptions) -> Self {
        Self { tree, options }
    }

    pub fn patch(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        MANIFESTS
            .iter()
            .map(|manifest| self.patch_manifest(manifest))
            .collect()
    }

    fn patch_manifest(&self, relative: &str) -> Result<PatchOutcome, PatchError> {
        let path = self.tree.resolve(relative)?;
        let buffer = FileBuffer::read(&path)?;

        match add_lib_section(&path, buffer.text())? {
            LibSection::Present => {
                warn!("[lib] section already exists in {}, skipping.", path.display());
                Ok(PatchOutcome::Skipped { file: path })
            }
            LibSection::NoPackage => {
                warn!("[package] section not found in {}, skipping.", path.display());
                Ok(PatchOutcome::Skipped { file: path })
            }
            LibSection::Inserted(patched) => {
                let outcome = buffer.commit(&patched, self.options)?;
                outcome.log();
                Ok(outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn insert(content: &str) -> LibSection {
        add_lib_section(Path::new("Cargo.toml"), content).unwrap()
    }

    #[test]
    fn test_insert_before_next_table() {
        let content = "[package]\nname = \"temporal_rs\"\n\n[dependencies]\ntinystr = \"0.8\"\n";
        let expected = "[package]\nname = \"temporal_rs\"\n\n[lib]\ncrate-type = [\"staticlib\", \"rlib\"]\n\n[dependencies]\ntinystr = \"0.8\"\n";
        assert_eq!(insert(content), LibSection::Inserted(expected.to_string()));
    }

    #[test]
    fn test_insert_at_end_of_file() {
        let content = "[package]\nname = \"temporal_capi\"\n";
        match insert(content) {
            LibSection::Inserted(patched) => {
                assert_eq!(patched, format!("{content}{LIB_SECTION}"));
                let doc = patched.parse::<DocumentMut>().unwrap();
                assert_eq!(doc["lib"]["crate-type"].as_array().unwrap().len(), 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_insert_after_commented_header() {
        let content = "[package] # crate metadata\r\nname = \"temporal_rs\"\r\n\r\n[features]\r\n";
        match insert(content) {
            LibSection::Inserted(patched) => {
                assert!(patched.starts_with("[package] # crate metadata\r\nname"));
                let doc = patched.parse::<DocumentMut>().unwrap();
                assert!(doc.contains_key("lib"));
                assert!(doc.contains_key("features"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_existing_lib_is_present() {
        let content = "[package]\nname = \"x\"\n\n[lib]\npath = \"src/lib.rs\"\n";
        assert_eq!(insert(content), LibSection::Present);
    }

    #[test]
    fn test_workspace_manifest_has_no_package() {
        let content = "[workspace]\nmembers = [\"temporal_capi\"]\n";
        assert_eq!(insert(content), LibSection::NoPackage);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = add_lib_section(Path::new("Cargo.toml"), "[package\n").unwrap_err();
        assert!(matches!(err, PatchError::Toml { .. }));
    }

    #[test]
    fn test_patcher_second_run_skips() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("temporal_capi")).unwrap();
        fs::write(root.join("Cargo.toml"), "[package]\nname = \"temporal_rs\"\n").unwrap();
        fs::write(
            root.join("temporal_capi/Cargo.toml"),
            "[package]\nname = \"temporal_capi\"\n\n[features]\ndefault = []\n",
        )
        .unwrap();

        let patcher = TemporalPatcher::new(TreeGuard::new(root).unwrap(), WriteOptions::default());
        let first = patcher.patch().unwrap();
        assert!(first.iter().all(|o| matches!(o, PatchOutcome::Patched { .. })));

        let second = patcher.patch().unwrap();
        assert!(second.iter().all(PatchOutcome::is_skipped));
    }
}
