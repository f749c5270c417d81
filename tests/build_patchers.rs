//! Node.js, V8 and temporal tree patching against fixture trees
//!
//! Host checks are bypassed through `patch_tree` so every fixture runs on
//! any CI platform.

use javet_patcher::node::{MakefileSelection, NodeBuildPatcher, MAKE_FILES};
use javet_patcher::temporal::{TemporalPatcher, LIB_SECTION};
use javet_patcher::v8::{V8BuildPatcher, INCLUDE_CFLAGS};
use javet_patcher::{PatchOutcome, TreeGuard, WriteOptions};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const LIBUV_MK: &str = "# This file is generated by gyp; do not edit.

TOOLSET := target
TARGET := libuv
CFLAGS_Release := \\
\t-pthread \\
\t-Wall \\
\t-O3

CFLAGS_C_Release := -std=gnu11

CFLAGS_CC_Release := \\
\t-fno-rtti \\
\t-fno-exceptions

LDFLAGS_Release := \\
\t-pthread \\
\t-rdynamic
";

fn setup_node_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "common.gypi",
        "        'conditions': [\n          ['_type==\"static_library\" and OS==\"solaris\"', {\n            'standalone_static_library': 1,\n          }],\n        ],\n",
    );
    write(dir.path(), "out/deps/uv/libuv.target.mk", LIBUV_MK);
    write(
        dir.path(),
        "out/deps/extra/extra.target.mk",
        "CFLAGS_Release := -O2\n",
    );
    dir
}

#[test]
fn test_node_tree_listed_makefiles() {
    let dir = setup_node_tree();
    let patcher = NodeBuildPatcher::new(
        TreeGuard::new(dir.path()).unwrap(),
        MakefileSelection::Listed,
        WriteOptions::default(),
    );

    let outcomes = patcher.patch_tree().unwrap();
    // common.gypi plus the one listed makefile that exists
    assert_eq!(outcomes.len(), 2);
    assert!(MAKE_FILES.contains(&"out/deps/uv/libuv.target.mk"));

    let gypi = fs::read_to_string(dir.path().join("common.gypi")).unwrap();
    assert!(gypi.contains("['_type==\"static_library\"', {"));
    assert!(!gypi.contains("solaris"));

    let mk = fs::read_to_string(dir.path().join("out/deps/uv/libuv.target.mk")).unwrap();
    assert!(mk.contains("CFLAGS_Release := \\\n    -fPIC \\\n\t-pthread \\\n"));
    assert!(mk.contains("CFLAGS_C_Release := -std=gnu11 -fPIC \n"));
    assert!(mk.contains("CFLAGS_CC_Release := \\\n    -fPIC \\\n\t-fno-rtti"));
    assert!(mk.contains("LDFLAGS_Release := \\\n    -fPIC \\\n\t-pthread"));

    // Not on the list, so untouched
    let extra = fs::read_to_string(dir.path().join("out/deps/extra/extra.target.mk")).unwrap();
    assert_eq!(extra, "CFLAGS_Release := -O2\n");

    let again = patcher.patch_tree().unwrap();
    assert!(again.iter().all(PatchOutcome::is_skipped));
}

#[test]
fn test_node_tree_all_makefiles() {
    let dir = setup_node_tree();
    let patcher = NodeBuildPatcher::new(
        TreeGuard::new(dir.path()).unwrap(),
        MakefileSelection::All,
        WriteOptions::default(),
    );

    let outcomes = patcher.patch_tree().unwrap();
    assert_eq!(outcomes.len(), 3);

    let extra = fs::read_to_string(dir.path().join("out/deps/extra/extra.target.mk")).unwrap();
    assert_eq!(
        extra,
        "CFLAGS_Release := -O2 -fPIC -ftls-model=global-dynamic -Wno-return-type \n"
    );
}

#[test]
fn test_v8_tree_current() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "out.gn/x64.release/obj/v8_base_without_compiler.ninja",
        "defines = -DV8_TARGET_ARCH_X64\ncflags = -Wall -Werror -O3\ncflags_cc = -std=c++20\n",
    );
    write(
        dir.path(),
        "out.gn/arm64.release/toolchain.ninja",
        "rule cxx\n  command = clang++ $cflags\n",
    );
    let patcher = V8BuildPatcher::new(TreeGuard::new(dir.path()).unwrap(), WriteOptions::default());

    let outcomes = patcher.patch_tree().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, PatchOutcome::Patched { .. }))
            .count(),
        1
    );

    let ninja = fs::read_to_string(
        dir.path()
            .join("out.gn/x64.release/obj/v8_base_without_compiler.ninja"),
    )
    .unwrap();
    let cflags = ninja.lines().nth(1).unwrap();
    assert!(cflags.starts_with("cflags = -Wall -O3 "));
    assert!(!cflags.split(' ').any(|flag| flag == "-Werror"));
    for flag in INCLUDE_CFLAGS {
        assert_eq!(cflags.split(' ').filter(|f| *f == flag).count(), 1);
    }
    assert!(ninja.ends_with("cflags_cc = -std=c++20\n"));
}

#[test]
fn test_temporal_tree() {
    let dir = TempDir::new().unwrap();
    let workspace = "[package]\nname = \"temporal_rs\"\nversion = \"0.1.0\"\n\n[dependencies]\nicu_calendar = \"2\"\n";
    write(dir.path(), "Cargo.toml", workspace);
    write(
        dir.path(),
        "temporal_capi/Cargo.toml",
        "[package]\nname = \"temporal_capi\"\n\n[lib]\ncrate-type = [\"cdylib\"]\n",
    );

    let patcher = TemporalPatcher::new(TreeGuard::new(dir.path()).unwrap(), WriteOptions::default());
    let outcomes = patcher.patch().unwrap();

    assert!(matches!(outcomes[0], PatchOutcome::Patched { .. }));
    assert!(outcomes[1].is_skipped());

    let manifest = fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
    assert!(manifest.contains(LIB_SECTION));
    assert!(manifest.find("[lib]").unwrap() < manifest.find("[dependencies]").unwrap());
}

#[test]
fn test_temporal_missing_manifest_is_an_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Cargo.toml", "[package]\nname = \"temporal_rs\"\n");

    let patcher = TemporalPatcher::new(TreeGuard::new(dir.path()).unwrap(), WriteOptions::default());
    assert!(patcher.patch().is_err());
}
