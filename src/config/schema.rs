use crate::buffer::LineSeparator;
use crate::version::Version;
use regex::Regex;
use serde::Deserialize;
use std::fmt;

/// Name of the capture group whose span a target pattern replaces.
pub const VERSION_GROUP: &str = "version";

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TargetSetConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub targets: Vec<TargetDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Canonical version every target is bumped to
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetDefinition {
    /// Path relative to the repository root
    pub file: String,
    #[serde(default)]
    pub separator: LineSeparator,
    /// Tried in order; the first match on a line wins
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// A target with its patterns compiled.
#[derive(Debug, Clone)]
pub struct Target {
    pub file: String,
    pub separator: LineSeparator,
    pub patterns: Vec<Regex>,
}

/// A validated, compiled target set.
#[derive(Debug, Clone)]
pub struct TargetSet {
    pub name: String,
    pub description: Option<String>,
    pub version: Version,
    pub targets: Vec<Target>,
}

impl TargetSet {
    /// Replace the canonical version, e.g. from a `--to` flag.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }
}

impl TargetSetConfig {
    /// Validate every field and compile the patterns.
    ///
    /// All problems are collected rather than stopping at the first one.
    pub fn compile(&self) -> Result<TargetSet, ValidationError> {
        let mut issues = Vec::new();

        if self.meta.name.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                file: None,
                field: "meta.name",
            });
        }

        let version = match Version::parse(self.meta.version.trim()) {
            Ok(version) => Some(version),
            Err(e) => {
                issues.push(ValidationIssue::InvalidVersion {
                    message: e.to_string(),
                });
                None
            }
        };

        if self.targets.is_empty() {
            issues.push(ValidationIssue::EmptyTargetList);
        }

        let mut targets = Vec::with_capacity(self.targets.len());
        for definition in &self.targets {
            if definition.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    file: None,
                    field: "file",
                });
                continue;
            }
            if definition.patterns.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    file: Some(definition.file.clone()),
                    field: "patterns",
                });
                continue;
            }

            let mut patterns = Vec::with_capacity(definition.patterns.len());
            for pattern in &definition.patterns {
                match Regex::new(pattern) {
                    Ok(regex) => {
                        if regex.capture_names().flatten().any(|n| n == VERSION_GROUP) {
                            patterns.push(regex);
                        } else {
                            issues.push(ValidationIssue::MissingVersionGroup {
                                file: definition.file.clone(),
                                pattern: pattern.clone(),
                            });
                        }
                    }
                    Err(e) => issues.push(ValidationIssue::InvalidPattern {
                        file: definition.file.clone(),
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    }),
                }
            }

            targets.push(Target {
                file: definition.file.clone(),
                separator: definition.separator,
                patterns,
            });
        }

        match version {
            Some(version) if issues.is_empty() => Ok(TargetSet {
                name: self.meta.name.clone(),
                description: self.meta.description.clone(),
                version,
                targets,
            }),
            _ => Err(ValidationError { issues }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyTargetList,
    MissingField {
        file: Option<String>,
        field: &'static str,
    },
    InvalidVersion {
        message: String,
    },
    InvalidPattern {
        file: String,
        pattern: String,
        message: String,
    },
    MissingVersionGroup {
        file: String,
        pattern: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyTargetList => write!(f, "target set contains no targets"),
            ValidationIssue::MissingField { file, field } => match file {
                Some(file) => write!(f, "target '{file}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::InvalidVersion { message } => write!(f, "meta.version: {message}"),
            ValidationIssue::InvalidPattern {
                file,
                pattern,
                message,
            } => write!(f, "target '{file}' pattern '{pattern}' does not compile: {message}"),
            ValidationIssue::MissingVersionGroup { file, pattern } => write!(
                f,
                "target '{file}' pattern '{pattern}' has no '{VERSION_GROUP}' capture group"
            ),
        }
    }
}
