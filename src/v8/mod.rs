//! V8 build tree patches.
//!
//! [`current`] handles today's `out.gn*` ninja trees on Linux and Windows.
//! [`legacy`] keeps the old Windows-only `v8_wrappers` workaround for
//! rebuilding older engine versions.

pub mod current;
pub mod legacy;
pub mod ninja;

pub use current::{V8BuildPatcher, EXCLUDE_CFLAGS, INCLUDE_CFLAGS};
pub use legacy::LegacyV8BuildPatcher;
pub use ninja::{patch_cflags_line, patch_cflags_text, CFLAGS_PREFIX};
