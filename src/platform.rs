//! Host platform gate for patch steps that only make sense on one OS.

use crate::error::PatchError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Linux,
    MacOs,
    Windows,
    Other(&'static str),
}

impl HostPlatform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &'static str) -> Self {
        match os {
            "linux" => HostPlatform::Linux,
            "macos" => HostPlatform::MacOs,
            "windows" => HostPlatform::Windows,
            other => HostPlatform::Other(other),
        }
    }

    /// Fail with [`PatchError::UnsupportedPlatform`] unless `self` is one of `allowed`.
    pub fn require(self, task: &'static str, allowed: &[HostPlatform]) -> Result<(), PatchError> {
        if allowed.contains(&self) {
            return Ok(());
        }
        let required = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and ");
        Err(PatchError::UnsupportedPlatform {
            task,
            required,
            host: self,
        })
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostPlatform::Linux => write!(f, "Linux"),
            HostPlatform::MacOs => write!(f, "macOS"),
            HostPlatform::Windows => write!(f, "Windows"),
            HostPlatform::Other(os) => write!(f, "{os}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os() {
        assert_eq!(HostPlatform::from_os("linux"), HostPlatform::Linux);
        assert_eq!(HostPlatform::from_os("windows"), HostPlatform::Windows);
        assert_eq!(HostPlatform::from_os("freebsd"), HostPlatform::Other("freebsd"));
    }

    #[test]
    fn test_require() {
        assert!(HostPlatform::Linux
            .require("node", &[HostPlatform::Linux])
            .is_ok());

        let err = HostPlatform::MacOs
            .require("v8", &[HostPlatform::Linux, HostPlatform::Windows])
            .unwrap_err();
        assert_eq!(err.to_string(), "v8 is for Linux and Windows only (host: macOS)");
    }
}
