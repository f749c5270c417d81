pub mod builtin;
pub mod loader;
pub mod schema;

pub use builtin::{builtin_set, BuiltinSet};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    Metadata, Target, TargetDefinition, TargetSet, TargetSetConfig, ValidationError,
    ValidationIssue, VERSION_GROUP,
};
