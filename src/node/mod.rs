//! Node.js build tree patches.
//!
//! Usage against a Node.js checkout on Linux:
//!
//! 1. `javet-patcher node -p <node>` (patches `common.gypi`)
//! 2. `./configure --enable-static --without-intl`
//! 3. `javet-patcher node -p <node>` again (patches the generated makefiles)
//! 4. `make -j4`

pub mod arm;
pub mod make;

pub use arm::{ArmFlagPatcher, PointerAuthFlag};
pub use make::{
    patch_common_text, patch_makefile_text, MakeFlags, MakefileSelection, NodeBuildPatcher,
    MAKE_FILES,
};
