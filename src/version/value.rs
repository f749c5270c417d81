//! Dotted-number version values.
//!
//! Javet and Node.js versions have three components, V8 versions four.
//! Resource files spell the same value with commas (`5,0,2`).

use std::fmt;
use std::str::FromStr;

/// Errors while parsing a version value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Neither three nor four components
    ComponentCount { value: String, count: usize },
    /// A component is empty or not all ASCII digits
    InvalidComponent { value: String, component: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::ComponentCount { value, count } => {
                write!(
                    f,
                    "invalid version '{}': expected 3 or 4 components, found {}",
                    value, count
                )
            }
            VersionError::InvalidComponent { value, component } => {
                write!(
                    f,
                    "invalid version '{}': component '{}' is not a number",
                    value, component
                )
            }
        }
    }
}

impl std::error::Error for VersionError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    text: String,
}

impl Version {
    /// Parse a dotted version such as `5.0.2` or `14.4.258.13`.
    ///
    /// # Examples
    ///
    /// ```
    /// use javet_patcher::Version;
    ///
    /// let version: Version = "14.4.258.13".parse().unwrap();
    /// assert_eq!(version.component_count(), 4);
    /// assert_eq!(version.comma_separated(), "14,4,258,13");
    /// assert!("1.2".parse::<Version>().is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, VersionError> {
        let components: Vec<&str> = value.split('.').collect();
        if !(3..=4).contains(&components.len()) {
            return Err(VersionError::ComponentCount {
                value: value.to_string(),
                count: components.len(),
            });
        }
        for component in &components {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::InvalidComponent {
                    value: value.to_string(),
                    component: component.to_string(),
                });
            }
        }
        Ok(Self {
            text: value.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn component_count(&self) -> usize {
        self.text.split('.').count()
    }

    pub fn comma_separated(&self) -> String {
        self.text.replace('.', ",")
    }

    /// Spelling to substitute for `matched`: commas if the matched text uses them.
    pub fn spelled_like(&self, matched: &str) -> String {
        if matched.contains(',') {
            self.comma_separated()
        } else {
            self.text.clone()
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_and_four_components() {
        assert_eq!(Version::parse("5.0.2").unwrap().as_str(), "5.0.2");
        assert_eq!(Version::parse("14.4.258.13").unwrap().component_count(), 4);
    }

    #[test]
    fn test_parse_rejects_component_count() {
        assert!(matches!(
            Version::parse("1.2"),
            Err(VersionError::ComponentCount { count: 2, .. })
        ));
        assert!(matches!(
            Version::parse("1.2.3.4.5"),
            Err(VersionError::ComponentCount { count: 5, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(
            Version::parse("1.x.3"),
            Err(VersionError::InvalidComponent { .. })
        ));
        assert!(matches!(
            Version::parse("1..3"),
            Err(VersionError::InvalidComponent { .. })
        ));
        assert!(Version::parse("1.2.3-beta").is_err());
    }

    #[test]
    fn test_spelled_like() {
        let version = Version::parse("2.0.0").unwrap();
        assert_eq!(version.spelled_like("1.9.4"), "2.0.0");
        assert_eq!(version.spelled_like("1,9,4"), "2,0,0");
    }
}
