//! `args.gn` files for every V8 build target Javet ships.

use crate::buffer::{read_optional, write_if_changed, PatchOutcome, WriteOptions};
use crate::error::PatchError;
use crate::safety::TreeGuard;
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Output directory, relative to the Javet repository root.
pub const OUTPUT_DIR: &str = "scripts/v8/gn";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GnError {
    #[error("Invalid OS: {0}. Valid options: android, linux, macos, windows")]
    UnknownOs(String),

    #[error("Invalid architecture: {0}. Valid options: arm, arm64, x86, x86_64")]
    UnknownArch(String),

    #[error("Invalid architecture {arch} for OS {os}. Valid options: {valid}")]
    UnsupportedArch {
        os: TargetOs,
        arch: Arch,
        valid: String,
    },

    #[error("Both --os and --arch must be specified together")]
    PartialTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Android,
    Linux,
    MacOs,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Arm,
    Arm64,
    X86,
    X86_64,
}

impl TargetOs {
    pub const ALL: [TargetOs; 4] = [
        TargetOs::Android,
        TargetOs::Linux,
        TargetOs::MacOs,
        TargetOs::Windows,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetOs::Android => "android",
            TargetOs::Linux => "linux",
            TargetOs::MacOs => "macos",
            TargetOs::Windows => "windows",
        }
    }

    fn platform(self) -> &'static Platform {
        match self {
            TargetOs::Android => &ANDROID,
            TargetOs::Linux => &LINUX,
            TargetOs::MacOs => &MACOS,
            TargetOs::Windows => &WINDOWS,
        }
    }

    pub fn architectures(self) -> &'static [Arch] {
        self.platform().architectures
    }
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
        }
    }

    /// GN's name for the CPU.
    pub fn target_cpu(self) -> &'static str {
        match self {
            Arch::X86_64 => "x64",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetOs {
    type Err = GnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetOs::ALL
            .into_iter()
            .find(|os| os.as_str() == s)
            .ok_or_else(|| GnError::UnknownOs(s.to_string()))
    }
}

impl FromStr for Arch {
    type Err = GnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Arch::Arm, Arch::Arm64, Arch::X86, Arch::X86_64]
            .into_iter()
            .find(|arch| arch.as_str() == s)
            .ok_or_else(|| GnError::UnknownArch(s.to_string()))
    }
}

/// Per-OS toolchain settings. `None` keeps the key out of the file.
struct Platform {
    architectures: &'static [Arch],
    target_os: Option<&'static str>,
    clang_modules: Option<bool>,
    custom_libcxx: bool,
    custom_libunwind: Option<bool>,
    safe_libstdcxx: Option<bool>,
}

static ANDROID: Platform = Platform {
    architectures: &[Arch::Arm, Arch::Arm64, Arch::X86, Arch::X86_64],
    target_os: Some("android"),
    clang_modules: None,
    custom_libcxx: false,
    custom_libunwind: None,
    safe_libstdcxx: None,
};

static LINUX: Platform = Platform {
    architectures: &[Arch::Arm64, Arch::X86_64],
    target_os: None,
    clang_modules: Some(false),
    custom_libcxx: true,
    custom_libunwind: Some(true),
    safe_libstdcxx: Some(false),
};

static MACOS: Platform = Platform {
    architectures: &[Arch::Arm64, Arch::X86_64],
    target_os: None,
    clang_modules: Some(false),
    custom_libcxx: false,
    custom_libunwind: None,
    safe_libstdcxx: None,
};

static WINDOWS: Platform = Platform {
    architectures: &[Arch::X86_64],
    target_os: None,
    clang_modules: None,
    custom_libcxx: false,
    custom_libunwind: None,
    safe_libstdcxx: None,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GnValue {
    Bool(bool),
    Int(u32),
    Str(&'static str),
}

impl fmt::Display for GnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GnValue::Bool(value) => write!(f, "{value}"),
            GnValue::Int(value) => write!(f, "{value}"),
            GnValue::Str(value) => write!(f, "\"{value}\""),
        }
    }
}

/// One build flavor: a supported OS/arch pair plus the i18n switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GnTarget {
    pub os: TargetOs,
    pub arch: Arch,
    pub i18n: bool,
}

impl GnTarget {
    pub fn new(os: TargetOs, arch: Arch, i18n: bool) -> Result<Self, GnError> {
        if !os.architectures().contains(&arch) {
            let valid = os
                .architectures()
                .iter()
                .map(|arch| arch.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(GnError::UnsupportedArch { os, arch, valid });
        }
        Ok(Self { os, arch, i18n })
    }

    /// Every supported flavor, i18n first.
    pub fn all() -> Vec<GnTarget> {
        let mut targets = Vec::new();
        for os in TargetOs::ALL {
            for &arch in os.architectures() {
                for i18n in [true, false] {
                    targets.push(GnTarget { os, arch, i18n });
                }
            }
        }
        targets
    }

    /// Resolve the `--os`/`--arch` pair: both select one flavor, neither selects all.
    pub fn select(
        os: Option<TargetOs>,
        arch: Option<Arch>,
        i18n: bool,
    ) -> Result<Vec<GnTarget>, GnError> {
        match (os, arch) {
            (Some(os), Some(arch)) => Ok(vec![GnTarget::new(os, arch, i18n)?]),
            (None, None) => Ok(GnTarget::all()),
            _ => Err(GnError::PartialTarget),
        }
    }

    pub fn file_name(&self) -> String {
        let suffix = if self.i18n { "i18n" } else { "non-i18n" };
        format!("{}-{}-{}-args.gn", self.os, self.arch, suffix)
    }

    /// Build arguments in file order.
    pub fn args(&self) -> Vec<(&'static str, GnValue)> {
        let platform = self.os.platform();
        let cpu = GnValue::Str(self.arch.target_cpu());

        let args: [(&'static str, Option<GnValue>); 24] = [
            ("clang_use_chrome_plugins", Some(GnValue::Bool(false))),
            ("compiler_timing", Some(GnValue::Bool(true))),
            ("dcheck_always_on", Some(GnValue::Bool(false))),
            ("is_component_build", Some(GnValue::Bool(false))),
            ("is_debug", Some(GnValue::Bool(false))),
            ("is_official_build", Some(GnValue::Bool(false))),
            ("symbol_level", Some(GnValue::Int(0))),
            ("target_cpu", Some(cpu)),
            ("target_os", platform.target_os.map(GnValue::Str)),
            ("use_blink", Some(GnValue::Bool(false))),
            ("use_clang_modules", platform.clang_modules.map(GnValue::Bool)),
            ("use_custom_libcxx", Some(GnValue::Bool(platform.custom_libcxx))),
            ("use_custom_libunwind", platform.custom_libunwind.map(GnValue::Bool)),
            ("use_safe_libstdcxx", platform.safe_libstdcxx.map(GnValue::Bool)),
            ("v8_enable_i18n_support", Some(GnValue::Bool(self.i18n))),
            ("v8_enable_pointer_compression", Some(GnValue::Bool(false))),
            ("v8_enable_sandbox", Some(GnValue::Bool(false))),
            ("v8_enable_temporal_support", Some(GnValue::Bool(false))),
            ("v8_enable_webassembly", Some(GnValue::Bool(true))),
            ("v8_monolithic", Some(GnValue::Bool(true))),
            ("v8_monolithic_for_shared_library", Some(GnValue::Bool(true))),
            ("v8_static_library", Some(GnValue::Bool(true))),
            ("v8_target_cpu", Some(cpu)),
            ("v8_use_external_startup_data", Some(GnValue::Bool(false))),
        ];

        args.into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect()
    }

    pub fn render(&self) -> String {
        self.args()
            .iter()
            .map(|(key, value)| format!("{key} = {value}\n"))
            .collect()
    }
}

pub struct GnArgsGenerator {
    tree: TreeGuard,
    options: WriteOptions,
}

impl GnArgsGenerator {
    pub fn new(tree: TreeGuard, options: WriteOptions) -> Self {
        Self { tree, options }
    }

    pub fn output_dir(&self) -> Result<PathBuf, PatchError> {
        Ok(self.tree.resolve(OUTPUT_DIR)?)
    }

    pub fn generate(&self, targets: &[GnTarget]) -> Result<Vec<PatchOutcome>, PatchError> {
        let output_dir = self.output_dir()?;
        if !self.options.dry_run {
            fs::create_dir_all(&output_dir).map_err(|e| PatchError::io(&output_dir, e))?;
        }

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let path = self.tree.resolve(output_dir.join(target.file_name()))?;
            let content = target.render();
            debug!("{}:\n{}", target.file_name(), content);

            let original = read_optional(&path)?;
            let outcome =
                write_if_changed(&path, original.as_deref(), content.as_bytes(), self.options)?;
            outcome.log();
            outcomes.push(outcome);
        }

        info!(
            "{} {} files total.",
            if self.options.dry_run {
                "Would generate"
            } else {
                "Generated"
            },
            outcomes.len()
        );
        Ok(outcomes)
    }
}
