//! Host operating system and its default build targets

use nativebuilds_package::BuildTarget;
use std::fmt;

/// Operating system the packaging run executes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    MacOs,
    Linux { arm64: bool },
    Windows,
}

impl HostOs {
    /// Host of the running process; unknown systems are treated as Linux
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux {
                arm64: cfg!(target_arch = "aarch64"),
            }
        }
    }

    /// Name used in snapshot file names
    pub fn name(&self) -> &'static str {
        match self {
            Self::MacOs => "macOS",
            Self::Linux { .. } => "Linux",
            Self::Windows => "Windows",
        }
    }

    /// Targets built on this host when none are configured
    pub fn default_targets(&self) -> Vec<BuildTarget> {
        use BuildTarget::*;
        match self {
            Self::MacOs => vec![
                IosArm64,
                IosSimulatorArm64,
                IosX64,
                TvosArm64,
                TvosSimulatorArm64,
                TvosX64,
                WatchosArm32,
                WatchosDeviceArm64,
                WatchosArm64,
                WatchosSimulatorArm64,
                WatchosX64,
                MacosArm64,
                MacosX64,
            ],
            Self::Linux { arm64: true } => vec![LinuxArm64],
            Self::Linux { arm64: false } => vec![
                LinuxX64,
                AndroidNativeArm64,
                AndroidNativeArm32,
                AndroidNativeX64,
                AndroidNativeX86,
            ],
            Self::Windows => vec![MingwX64],
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HostOs::MacOs, 13, BuildTarget::IosArm64)]
    #[case(HostOs::Linux { arm64: true }, 1, BuildTarget::LinuxArm64)]
    #[case(HostOs::Linux { arm64: false }, 5, BuildTarget::LinuxX64)]
    #[case(HostOs::Windows, 1, BuildTarget::MingwX64)]
    fn test_default_targets(#[case] host: HostOs, #[case] count: usize, #[case] first: BuildTarget) {
        let targets = host.default_targets();
        assert_eq!(targets.len(), count);
        assert_eq!(targets[0], first);
    }

    #[test]
    fn test_names() {
        assert_eq!(HostOs::MacOs.to_string(), "macOS");
        assert_eq!(HostOs::Linux { arm64: true }.name(), "Linux");
    }
}
