//! Javet Patcher: release and build-tree maintenance for Javet
//!
//! Keeps version strings in sync across the Javet repository and applies the
//! textual fixes the embedded Node.js and V8 build systems need before they
//! produce static, position independent libraries.
//!
//! # Architecture
//!
//! Every operation reads a [`buffer::FileBuffer`], rewrites its text with a
//! pure function, and writes only when the bytes differ. Build fragments are
//! split on `\n`; version targets split on the separator their target set
//! declares. Each step returns one [`PatchOutcome`] per file so callers can
//! summarize a run.
//!
//! - [`version`]: regex-driven version bumps over [`config`] target sets
//! - [`node`]: `common.gypi` and generated makefile fixes, arm64 flags
//! - [`v8`]: ninja `cflags` fixes (current and legacy Windows variants)
//! - [`temporal`]: `staticlib` output for the temporal crates
//! - [`gn`]: `args.gn` generation for every shipped target
//! - [`android`]: the Android mirror of the Java sources
//!
//! # Safety
//!
//! - Atomic file writes (tempfile + fsync + rename) that bump mtimes
//! - Every path is resolved through a [`TreeGuard`]
//! - Second runs report [`PatchOutcome::Skipped`] for every file
//!
//! # Example
//!
//! ```no_run
//! use javet_patcher::config::{builtin_set, BuiltinSet};
//! use javet_patcher::{TreeGuard, VersionUpdater, WriteOptions};
//!
//! let set = builtin_set(BuiltinSet::Javet)?;
//! let tree = TreeGuard::new(".")?;
//! for outcome in VersionUpdater::from_set(&set).update(&tree, WriteOptions::default())? {
//!     println!("{outcome}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod android;
pub mod buffer;
pub mod config;
pub mod error;
pub mod gn;
pub mod node;
pub mod platform;
pub mod safety;
pub mod temporal;
pub mod v8;
pub mod version;

// Re-exports
pub use android::AndroidMirror;
pub use buffer::{FileBuffer, LineSeparator, PatchOutcome, TextChange, WriteOptions};
pub use config::{load_from_path, load_from_str, ConfigError, Target, TargetSet};
pub use error::PatchError;
pub use gn::{GnArgsGenerator, GnTarget};
pub use node::{ArmFlagPatcher, NodeBuildPatcher};
pub use platform::HostPlatform;
pub use safety::{SafetyError, TreeGuard};
pub use temporal::TemporalPatcher;
pub use v8::{LegacyV8BuildPatcher, V8BuildPatcher};
pub use version::{Version, VersionError, VersionUpdater};
