use super::ninja::patch_cflags_text;
use crate::buffer::{FileBuffer, PatchOutcome, WriteOptions};
use crate::error::PatchError;
use crate::platform::HostPlatform;
use crate::safety::TreeGuard;
use log::info;
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Warnings newer clang turns into errors while building the monolith.
pub const INCLUDE_CFLAGS: [&str; 5] = [
    "-Wno-deprecated-copy-with-user-provided-copy",
    "-Wno-deprecated-declarations",
    "-Wno-invalid-offsetof",
    "-Wno-range-loop-construct",
    "-Wno-ctad-maybe-unsupported",
];

pub const EXCLUDE_CFLAGS: [&str; 1] = ["-Werror"];

const OUT_DIR_PREFIX: &str = "out.gn";
const NINJA_EXTENSION: &str = "ninja";

/// Relaxes warning flags in every generated ninja file of a V8 checkout.
///
/// Run after a first `ninja -C out.gn/x64.release v8_monolith` has generated
/// the build files, then build again.
pub struct V8BuildPatcher {
    tree: TreeGuard,
    options: WriteOptions,
}

impl V8BuildPatcher {
    pub fn new(tree: TreeGuard, options: WriteOptions) -> Self {
        Self { tree, options }
    }

    /// Patch the tree. Linux and Windows hosts only.
    pub fn patch(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        HostPlatform::current().require(
            "V8 build patching",
            &[HostPlatform::Linux, HostPlatform::Windows],
        )?;
        self.patch_tree()
    }

    pub fn patch_tree(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        let mut outcomes = Vec::new();
        for path in self.ninja_files()? {
            let buffer = FileBuffer::read(&path)?;
            let patched = patch_cflags_text(buffer.text(), &INCLUDE_CFLAGS, &EXCLUDE_CFLAGS);
            let outcome = buffer.commit(&patched, self.options)?;
            outcome.log();
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Every `*.ninja` file under the top-level `out.gn*` directories.
    pub fn ninja_files(&self) -> Result<Vec<PathBuf>, PatchError> {
        let root = self.tree.root();
        let mut out_dirs = Vec::new();
        for entry in fs::read_dir(root).map_err(|e| PatchError::io(root, e))? {
            let entry = entry.map_err(|e| PatchError::io(root, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| PatchError::io(entry.path(), e))?
                .is_dir();
            if is_dir && entry.file_name().to_string_lossy().starts_with(OUT_DIR_PREFIX) {
                out_dirs.push(entry.path());
            }
        }
        out_dirs.sort();

        let mut files = Vec::new();
        for out_dir in out_dirs {
            info!("Processing folder: {}", out_dir.display());
            for entry in WalkDir::new(&out_dir).sort_by_file_name() {
                let entry = entry.map_err(|e| PatchError::walk(&out_dir, e))?;
                if entry.file_type().is_file()
                    && entry.path().extension().and_then(|s| s.to_str()) == Some(NINJA_EXTENSION)
                {
                    files.push(self.tree.resolve(entry.path())?);
                }
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &std::path::Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discovers_only_out_gn_trees() {
        let temp_dir = tempfile::tempdir().unwrap();
        write(temp_dir.path(), "out.gn/x64.release/obj/v8_init.ninja", "");
        write(temp_dir.path(), "out.gn.arm64/build.ninja", "");
        write(temp_dir.path(), "out/x64/build.ninja", "");
        write(temp_dir.path(), "out.gn/args.gn", "");

        let patcher =
            V8BuildPatcher::new(TreeGuard::new(temp_dir.path()).unwrap(), WriteOptions::default());
        let files = patcher.ninja_files().unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "ninja"));
        assert!(files.iter().all(|f| !f.to_string_lossy().contains("/out/")));
    }

    #[test]
    fn test_patch_tree_twice_skips() {
        let temp_dir = tempfile::tempdir().unwrap();
        write(
            temp_dir.path(),
            "out.gn/x64.release/obj/v8_compiler.ninja",
            "defines = -DV8\ncflags = -Werror -O3\n",
        );
        let patcher =
            V8BuildPatcher::new(TreeGuard::new(temp_dir.path()).unwrap(), WriteOptions::default());

        let first = patcher.patch_tree().unwrap();
        assert!(matches!(first[0], PatchOutcome::Patched { .. }));

        let content = fs::read_to_string(
            temp_dir.path().join("out.gn/x64.release/obj/v8_compiler.ninja"),
        )
        .unwrap();
        assert_eq!(
            content,
            format!("defines = -DV8\ncflags = -O3 {}\n", INCLUDE_CFLAGS.join(" "))
        );

        let second = patcher.patch_tree().unwrap();
        assert!(second.iter().all(PatchOutcome::is_skipped));
    }
}
