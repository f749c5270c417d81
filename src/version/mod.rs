pub mod updater;
pub mod value;

pub use updater::{Replacement, Rewrite, VersionUpdater};
pub use value::{Version, VersionError};
