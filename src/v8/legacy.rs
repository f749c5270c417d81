//! Windows workaround for V8 versions whose `v8_wrappers` target produced
//! truncated ninja lines and an empty translation unit.
//!
//! Sequence: generate `args.gn`, run `ninja -C out.gn/x64.release v8_wrappers`,
//! patch, run it again, patch again, then build `v8_monolith`.

use super::ninja::patch_cflags_text;
use crate::buffer::{
    read_optional, write_if_changed, BufferError, FileBuffer, PatchOutcome, WriteOptions,
};
use crate::error::PatchError;
use crate::platform::HostPlatform;
use crate::safety::TreeGuard;
use log::debug;

pub const WRAPPERS_CC_FILE: &str = "src/base/platform/wrappers.cc";
pub const WRAPPERS_CC_CONTENT: &str = "#include \"src/base/platform/wrappers.h\"";
pub const WRAPPERS_NINJA_FILE: &str = "out.gn/x64.release/obj/v8_wrappers.ninja";
pub const WRAPPERS_LINE_OBJ: &str =
    "build obj/v8_wrappers.obj: cxx ../../src/base/platform/wrappers.cc";
pub const WRAPPERS_LINE_LIB: &str = "build obj/v8_wrappers.lib: alink obj/v8_wrappers.obj";

/// Lines at or below this length are too short to identify a truncated build edge.
const TRUNCATED_LINE_MIN: usize = 25;

pub const MONOLITH_CFLAGS: [&str; 2] = ["-Wno-invalid-offsetof", "-Wno-range-loop-construct"];

pub const MONOLITH_NINJA_FILES: [&str; 4] = [
    "out.gn/x64.release/obj/v8_base_without_compiler.ninja",
    "out.gn/x64.release/obj/v8_compiler.ninja",
    "out.gn/x64.release/obj/v8_initializers.ninja",
    "out.gn/x64.release/obj/v8_init.ninja",
];

/// Restore the `v8_wrappers` build edges ninja truncated.
///
/// A line that is a prefix of the object edge becomes the full object edge.
/// A line that is a prefix of the library edge becomes the full library edge,
/// preceded by the object edge if none was restored earlier.
pub fn patch_wrappers_ninja_text(content: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut obj_patched = false;

    for line in content.split('\n') {
        if line.len() > TRUNCATED_LINE_MIN {
            if WRAPPERS_LINE_OBJ.starts_with(line) {
                lines.push(WRAPPERS_LINE_OBJ);
                obj_patched = true;
                continue;
            }
            if WRAPPERS_LINE_LIB.starts_with(line) {
                if !obj_patched {
                    lines.push(WRAPPERS_LINE_OBJ);
                }
                lines.push(WRAPPERS_LINE_LIB);
                continue;
            }
        }
        lines.push(line);
    }

    lines.join("\n")
}

pub struct LegacyV8BuildPatcher {
    tree: TreeGuard,
    options: WriteOptions,
}

impl LegacyV8BuildPatcher {
    pub fn new(tree: TreeGuard, options: WriteOptions) -> Self {
        Self { tree, options }
    }

    /// Patch the tree. Windows hosts only.
    pub fn patch(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        HostPlatform::current().require("Legacy V8 build patching", &[HostPlatform::Windows])?;
        self.patch_tree()
    }

    pub fn patch_tree(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        let mut outcomes = self.patch_wrappers()?;
        outcomes.extend(self.patch_monolith()?);
        Ok(outcomes)
    }

    /// Overwrite `wrappers.cc` and repair `v8_wrappers.ninja`.
    ///
    /// The ninja file is mandatory: its absence means the first `v8_wrappers`
    /// build has not run yet.
    pub fn patch_wrappers(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        let cc_path = self.tree.resolve(WRAPPERS_CC_FILE)?;
        let original = read_optional(&cc_path)?;
        let cc = write_if_changed(
            &cc_path,
            original.as_deref(),
            WRAPPERS_CC_CONTENT.as_bytes(),
            self.options,
        )?;
        cc.log();

        let ninja_path = self.tree.resolve(WRAPPERS_NINJA_FILE)?;
        let buffer = FileBuffer::read(&ninja_path)?;
        let ninja = buffer.commit(&patch_wrappers_ninja_text(buffer.text()), self.options)?;
        ninja.log();

        Ok(vec![cc, ninja])
    }

    pub fn patch_monolith(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        let mut outcomes = Vec::new();
        for relative in MONOLITH_NINJA_FILES {
            let path = self.tree.resolve(relative)?;
            let buffer = match FileBuffer::read(&path) {
                Ok(buffer) => buffer,
                Err(BufferError::Missing(file)) => {
                    debug!("{} is not generated, skipping.", file.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let patched = patch_cflags_text(buffer.text(), &MONOLITH_CFLAGS, &[]);
            let outcome = buffer.commit(&patched, self.options)?;
            outcome.log();
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
