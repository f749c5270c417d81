use crate::buffer::{BufferError, FileBuffer, PatchOutcome, WriteOptions};
use crate::error::PatchError;
use crate::platform::HostPlatform;
use crate::safety::TreeGuard;
use log::{debug, error};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Build configuration that gates static-library arch flags on Solaris.
pub const COMMON_FILE: &str = "common.gypi";
pub const COMMON_OLD_KEY: &str = r#"_type=="static_library" and OS=="solaris""#;
pub const COMMON_NEW_KEY: &str = r#"_type=="static_library""#;

/// Flag assignments that must carry position independent code.
pub const MAKE_KEYS: [&str; 4] = [
    "CFLAGS_Release :=",
    "CFLAGS_C_Release :=",
    "CFLAGS_CC_Release :=",
    "LDFLAGS_Release :=",
];

pub const MAKE_FILES: [&str; 22] = [
    "out/libnode.target.mk",
    "out/tools/v8_gypfiles/torque_base.target.mk",
    "out/tools/v8_gypfiles/v8_base_without_compiler.target.mk",
    "out/deps/cares/cares.target.mk",
    "out/deps/uv/libuv.target.mk",
    "out/deps/openssl/openssl.target.mk",
    "out/deps/nghttp2/nghttp2.target.mk",
    "out/deps/ngtcp2/nghttp3.target.mk",
    "out/deps/ngtcp2/ngtcp2.target.mk",
    "out/tools/icu/icutools.host.mk",
    "out/tools/v8_gypfiles/v8_compiler.target.mk",
    "out/tools/v8_gypfiles/v8_libbase.target.mk",
    "out/deps/llhttp/llhttp.target.mk",
    "out/deps/zlib/zlib.target.mk",
    "out/deps/brotli/brotli.target.mk",
    "out/tools/v8_gypfiles/v8_zlib.target.mk",
    "out/tools/v8_gypfiles/v8_libsampler.target.mk",
    "out/tools/v8_gypfiles/v8_libplatform.target.mk",
    "out/tools/v8_gypfiles/v8_initializers.target.mk",
    "out/deps/histogram/histogram.target.mk",
    "out/deps/uvwasi/uvwasi.target.mk",
    "out/tools/v8_gypfiles/v8_snapshot.target.mk",
];

const ESCAPE: char = '\\';

/// Flags added to release assignments, as a continuation line and inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakeFlags {
    pub property: &'static str,
    pub inline: &'static str,
}

impl MakeFlags {
    /// Position independent code only.
    pub const PIC: MakeFlags = MakeFlags {
        property: "    -fPIC \\",
        inline: " -fPIC ",
    };

    /// Position independent code with a TLS model usable from a shared
    /// library, for current Node.js releases.
    pub const PIC_TLS: MakeFlags = MakeFlags {
        property: "    -fPIC -ftls-model=global-dynamic -Wno-return-type \\",
        inline: " -fPIC -ftls-model=global-dynamic -Wno-return-type ",
    };
}

/// Which generated makefiles get the `-fPIC` fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MakefileSelection {
    /// The fixed list in [`MAKE_FILES`]; absent entries are skipped
    #[default]
    Listed,
    /// Every `*.mk` file under `out/`
    All,
}

impl MakefileSelection {
    pub fn flags(self) -> MakeFlags {
        match self {
            MakefileSelection::Listed => MakeFlags::PIC,
            MakefileSelection::All => MakeFlags::PIC_TLS,
        }
    }
}

/// Replace the Solaris-only static library condition with the unconditional one.
pub fn patch_common_text(content: &str) -> String {
    content
        .split('\n')
        .map(|line| {
            if line.contains(COMMON_OLD_KEY) {
                line.replace(COMMON_OLD_KEY, COMMON_NEW_KEY)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Add `flags` to every release flag assignment in a generated makefile.
///
/// Single-line assignments get the flags appended inline. Assignments that
/// continue on the next line (trailing `\`) get `flags.property` inserted
/// after them unless that line is already there.
pub fn patch_makefile_text(content: &str, flags: MakeFlags) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut patch_required = false;

    for line in content.split('\n') {
        if patch_required {
            patch_required = false;
            if line != flags.property {
                lines.push(flags.property.to_string());
            }
        }

        let mut line = line.to_string();
        if MAKE_KEYS.iter().any(|key| line.starts_with(key)) {
            if line.ends_with(ESCAPE) {
                patch_required = true;
            } else if !line.ends_with(flags.inline) {
                line.push_str(flags.inline);
            }
        }
        lines.push(line);
    }

    lines.join("\n")
}

pub struct NodeBuildPatcher {
    tree: TreeGuard,
    selection: MakefileSelection,
    options: WriteOptions,
}

impl NodeBuildPatcher {
    pub fn new(tree: TreeGuard, selection: MakefileSelection, options: WriteOptions) -> Self {
        Self {
            tree,
            selection,
            options,
        }
    }

    /// Run both fixes. Linux hosts only.
    pub fn patch(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        HostPlatform::current().require("Node.js build patching", &[HostPlatform::Linux])?;
        self.patch_tree()
    }

    /// Run both fixes without the host check.
    pub fn patch_tree(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        let mut outcomes = vec![self.patch_common()?];
        outcomes.extend(self.patch_make_files()?);
        Ok(outcomes)
    }

    pub fn patch_common(&self) -> Result<PatchOutcome, PatchError> {
        let path = self.tree.resolve(COMMON_FILE)?;
        let buffer = match FileBuffer::read(&path) {
            Ok(buffer) => buffer,
            Err(BufferError::Missing(file)) => {
                let outcome = PatchOutcome::Missing { file };
                outcome.log();
                return Ok(outcome);
            }
            Err(e) => return Err(e.into()),
        };

        let outcome = buffer.commit(&patch_common_text(buffer.text()), self.options)?;
        outcome.log();
        Ok(outcome)
    }

    pub fn patch_make_files(&self) -> Result<Vec<PatchOutcome>, PatchError> {
        let flags = self.selection.flags();
        let mut outcomes = Vec::new();
        for path in self.make_files()? {
            let buffer = match FileBuffer::read(&path) {
                Ok(buffer) => buffer,
                Err(BufferError::Missing(file)) => {
                    // Which fragments exist depends on configure options.
                    debug!("{} is not generated, skipping.", file.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let outcome = buffer.commit(&patch_makefile_text(buffer.text(), flags), self.options)?;
            outcome.log();
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn make_files(&self) -> Result<Vec<PathBuf>, PatchError> {
        match self.selection {
            MakefileSelection::Listed => MAKE_FILES
                .iter()
                .map(|file| self.tree.resolve(file).map_err(PatchError::from))
                .collect(),
            MakefileSelection::All => {
                let out_dir = self.tree.resolve("out")?;
                if !out_dir.is_dir() {
                    error!("Failed to locate {}.", out_dir.display());
                    return Ok(Vec::new());
                }
                let mut files = Vec::new();
                for entry in WalkDir::new(&out_dir).sort_by_file_name() {
                    let entry = entry.map_err(|e| PatchError::walk(&out_dir, e))?;
                    if entry.file_type().is_file()
                        && entry.path().extension().and_then(|s| s.to_str()) == Some("mk")
                    {
                        files.push(self.tree.resolve(entry.path())?);
                    }
                }
                Ok(files)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_inline_flag_appended() {
        assert_eq!(
            patch_makefile_text("CFLAGS_Release := -O2", MakeFlags::PIC),
            "CFLAGS_Release := -O2 -fPIC "
        );
    }

    #[test]
    fn test_inline_flag_not_duplicated() {
        let once = patch_makefile_text("LDFLAGS_Release := -O2", MakeFlags::PIC);
        assert_eq!(patch_makefile_text(&once, MakeFlags::PIC), once);
    }

    #[test]
    fn test_continuation_line_inserted() {
        let input = "CFLAGS_CC_Release := \\\n\t-O3 \\\n\t-fno-rtti\n";
        let expected = "CFLAGS_CC_Release := \\\n    -fPIC \\\n\t-O3 \\\n\t-fno-rtti\n";
        let patched = patch_makefile_text(input, MakeFlags::PIC);
        assert_eq!(patched, expected);
        assert_eq!(patch_makefile_text(&patched, MakeFlags::PIC), expected);
    }

    #[test]
    fn test_tls_flags_inline_and_continuation() {
        let input = "CFLAGS_Release := -O2\nLDFLAGS_Release := \\\n\t-rdynamic\n";
        let expected = "CFLAGS_Release := -O2 -fPIC -ftls-model=global-dynamic -Wno-return-type \n\
                        LDFLAGS_Release := \\\n    -fPIC -ftls-model=global-dynamic -Wno-return-type \\\n\t-rdynamic\n";
        let patched = patch_makefile_text(input, MakeFlags::PIC_TLS);
        assert_eq!(patched, expected);
        assert_eq!(patch_makefile_text(&patched, MakeFlags::PIC_TLS), expected);
    }

    #[test]
    fn test_selection_flags() {
        assert_eq!(MakefileSelection::Listed.flags(), MakeFlags::PIC);
        assert_eq!(MakefileSelection::All.flags(), MakeFlags::PIC_TLS);
    }

    #[test]
    fn test_other_lines_untouched() {
        let input = "CFLAGS_Debug := -g\nDEFS_Release := \\\n\t'-DNDEBUG'\n";
        assert_eq!(patch_makefile_text(input, MakeFlags::PIC), input);
    }

    #[test]
    fn test_common_key_replaced() {
        let input = "      ['_type==\"static_library\" and OS==\"solaris\"', {\n";
        let expected = "      ['_type==\"static_library\"', {\n";
        assert_eq!(patch_common_text(input), expected);
        assert_eq!(patch_common_text(expected), expected);
    }

    #[test]
    fn test_patch_tree_missing_common_still_patches_makefiles() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mk = temp_dir.path().join("out/deps/uv/libuv.target.mk");
        fs::create_dir_all(mk.parent().unwrap()).unwrap();
        fs::write(&mk, "CFLAGS_Release := -O3\n").unwrap();

        let patcher = NodeBuildPatcher::new(
            TreeGuard::new(temp_dir.path()).unwrap(),
            MakefileSelection::Listed,
            WriteOptions::default(),
        );
        let outcomes = patcher.patch_tree().unwrap();

        assert!(matches!(outcomes[0], PatchOutcome::Missing { .. }));
        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            fs::read_to_string(&mk).unwrap(),
            "CFLAGS_Release := -O3 -fPIC \n"
        );
    }

    #[test]
    fn test_all_selection_walks_out_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mk = temp_dir.path().join("out/deps/custom/custom.target.mk");
        fs::create_dir_all(mk.parent().unwrap()).unwrap();
        fs::write(&mk, "LDFLAGS_Release := -s").unwrap();
        fs::write(temp_dir.path().join("common.gypi"), "{}\n").unwrap();

        let patcher = NodeBuildPatcher::new(
            TreeGuard::new(temp_dir.path()).unwrap(),
            MakefileSelection::All,
            WriteOptions::default(),
        );
        let outcomes = patcher.patch_tree().unwrap();

        assert!(outcomes[0].is_skipped());
        assert!(matches!(outcomes[1], PatchOutcome::Patched { .. }));
        assert_eq!(
            fs::read_to_string(&mk).unwrap(),
            "LDFLAGS_Release := -s -fPIC -ftls-model=global-dynamic -Wno-return-type "
        );
    }
}
