//! Target sets shipped with the binary.
//!
//! Each set lives in `targets/<name>.toml` next to this file and is embedded
//! at compile time. Releases edit the `version` in those files.

use crate::config::loader::{load_from_str, ConfigError};
use crate::config::schema::TargetSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinSet {
    Javet,
    Node,
    V8,
}

impl BuiltinSet {
    pub const ALL: [BuiltinSet; 3] = [BuiltinSet::Javet, BuiltinSet::Node, BuiltinSet::V8];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinSet::Javet => "javet",
            BuiltinSet::Node => "node",
            BuiltinSet::V8 => "v8",
        }
    }

    fn source(self) -> &'static str {
        match self {
            BuiltinSet::Javet => include_str!("targets/javet.toml"),
            BuiltinSet::Node => include_str!("targets/node.toml"),
            BuiltinSet::V8 => include_str!("targets/v8.toml"),
        }
    }
}

impl fmt::Display for BuiltinSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn builtin_set(set: BuiltinSet) -> Result<TargetSet, ConfigError> {
    load_from_str(set.source())
}
