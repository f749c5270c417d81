//! Android mirror of the canonical Java sources.
//!
//! The Android library builds from a copy of `src/main/java` with the JMX
//! imports commented out, a few APIs missing on Android swapped for
//! equivalents, and `ANDROID` conditional comments toggled.

pub mod sync;
pub mod transform;

pub use sync::{plan_prune, AndroidMirror, PrunePlan, TreeListing, MIRROR_DIR, SOURCE_DIR};
pub use transform::{transform_line, transform_source};
