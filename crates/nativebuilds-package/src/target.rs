//! Build target types (platform/architecture/ABI combinations)

use crate::PackageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kotlin/Native target a native library is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildTarget {
    IosArm64,
    IosSimulatorArm64,
    IosX64,

    WatchosDeviceArm64,
    WatchosArm64,
    WatchosArm32,
    WatchosSimulatorArm64,
    WatchosX64,

    TvosArm64,
    TvosSimulatorArm64,
    TvosX64,

    AndroidNativeArm64,
    AndroidNativeArm32,
    AndroidNativeX64,
    AndroidNativeX86,

    MacosArm64,
    MacosX64,

    LinuxArm64,
    LinuxX64,

    MingwX64,
    WindowsX64,

    Wasm32,
}

impl BuildTarget {
    pub const ALL: [BuildTarget; 22] = [
        Self::IosArm64,
        Self::IosSimulatorArm64,
        Self::IosX64,
        Self::WatchosDeviceArm64,
        Self::WatchosArm64,
        Self::WatchosArm32,
        Self::WatchosSimulatorArm64,
        Self::WatchosX64,
        Self::TvosArm64,
        Self::TvosSimulatorArm64,
        Self::TvosX64,
        Self::AndroidNativeArm64,
        Self::AndroidNativeArm32,
        Self::AndroidNativeX64,
        Self::AndroidNativeX86,
        Self::MacosArm64,
        Self::MacosX64,
        Self::LinuxArm64,
        Self::LinuxX64,
        Self::MingwX64,
        Self::WindowsX64,
        Self::Wasm32,
    ];

    /// Kotlin target name (also used as directory name)
    pub fn name(&self) -> &'static str {
        match self {
            Self::IosArm64 => "iosArm64",
            Self::IosSimulatorArm64 => "iosSimulatorArm64",
            Self::IosX64 => "iosX64",
            Self::WatchosDeviceArm64 => "watchosDeviceArm64",
            Self::WatchosArm64 => "watchosArm64",
            Self::WatchosArm32 => "watchosArm32",
            Self::WatchosSimulatorArm64 => "watchosSimulatorArm64",
            Self::WatchosX64 => "watchosX64",
            Self::TvosArm64 => "tvosArm64",
            Self::TvosSimulatorArm64 => "tvosSimulatorArm64",
            Self::TvosX64 => "tvosX64",
            Self::AndroidNativeArm64 => "androidNativeArm64",
            Self::AndroidNativeArm32 => "androidNativeArm32",
            Self::AndroidNativeX64 => "androidNativeX64",
            Self::AndroidNativeX86 => "androidNativeX86",
            Self::MacosArm64 => "macosArm64",
            Self::MacosX64 => "macosX64",
            Self::LinuxArm64 => "linuxArm64",
            Self::LinuxX64 => "linuxX64",
            Self::MingwX64 => "mingwX64",
            Self::WindowsX64 => "windowsX64",
            Self::Wasm32 => "wasm32",
        }
    }

    /// vcpkg triplet of the static build
    pub fn triplet(&self) -> &'static str {
        match self {
            Self::IosArm64 => "arm64-ios",
            Self::IosSimulatorArm64 => "arm64-ios-simulator",
            Self::IosX64 => "x64-ios",
            Self::WatchosDeviceArm64 => "arm64-watchos",
            Self::WatchosArm64 => "arm6432-watchos",
            Self::WatchosArm32 => "arm-watchos",
            Self::WatchosSimulatorArm64 => "arm64-watchos-simulator",
            Self::WatchosX64 => "x64-watchos-simulator",
            Self::TvosArm64 => "arm64-tvos",
            Self::TvosSimulatorArm64 => "arm64-tvos-simulator",
            Self::TvosX64 => "x64-tvos-simulator",
            Self::AndroidNativeArm64 => "arm64-android",
            Self::AndroidNativeArm32 => "arm-neon-android",
            Self::AndroidNativeX64 => "x64-android",
            Self::AndroidNativeX86 => "x86-android",
            Self::MacosArm64 => "arm64-osx",
            Self::MacosX64 => "x64-osx",
            Self::LinuxArm64 => "arm64-linux",
            Self::LinuxX64 => "x64-linux",
            Self::MingwX64 => "x64-mingw-static",
            Self::WindowsX64 => "x64-windows-static",
            Self::Wasm32 => "wasm32-emscripten",
        }
    }

    /// Device/native targets; emulation-only targets like wasm are not
    pub fn is_native(&self) -> bool {
        !matches!(self, Self::Wasm32)
    }

    /// Android ABI directory name (jniLibs/<abi>)
    pub fn android_abi(&self) -> Option<&'static str> {
        match self {
            Self::AndroidNativeArm64 => Some("arm64-v8a"),
            Self::AndroidNativeArm32 => Some("armeabi-v7a"),
            Self::AndroidNativeX64 => Some("x86_64"),
            Self::AndroidNativeX86 => Some("x86"),
            _ => None,
        }
    }

    /// Shared library loaded at runtime by the JVM (desktop)
    pub fn has_jvm_dynamic_lib(&self) -> bool {
        matches!(
            self,
            Self::LinuxArm64 | Self::LinuxX64 | Self::MacosArm64 | Self::MacosX64 | Self::MingwX64
        )
    }

    /// Whether a dynamically linked variant is built for this target
    pub fn has_dynamic_lib(&self) -> bool {
        self.has_jvm_dynamic_lib() || self.android_abi().is_some()
    }

    /// Triplet whose settings the dynamic overlay triplet starts from
    pub fn base_dynamic_triplet(&self) -> Option<&'static str> {
        match self {
            Self::AndroidNativeArm64
            | Self::AndroidNativeArm32
            | Self::AndroidNativeX64
            | Self::AndroidNativeX86 => Some(self.triplet()),
            Self::LinuxArm64 => Some("arm64-linux-dynamic"),
            Self::LinuxX64 => Some("x64-linux-dynamic"),
            Self::MacosArm64 => Some("arm64-osx-dynamic"),
            Self::MacosX64 => Some("x64-osx-dynamic"),
            Self::MingwX64 => Some("x64-mingw-dynamic"),
            _ => None,
        }
    }

    /// Overlay triplet used for the dynamic build
    pub fn dynamic_triplet(&self) -> Option<String> {
        self.base_dynamic_triplet().map(|base| {
            if base.ends_with("-dynamic") {
                base.to_string()
            } else {
                format!("{}-dynamic", base)
            }
        })
    }

    /// Identifiers a platform expression is evaluated against
    pub fn platform_identifiers(&self) -> &'static [&'static str] {
        match self {
            Self::IosArm64 | Self::IosSimulatorArm64 => &["ios", "arm64", "static"],
            Self::IosX64 => &["ios", "x64", "static"],
            Self::WatchosDeviceArm64 | Self::WatchosArm64 | Self::WatchosSimulatorArm64 => {
                &["watchos", "arm64", "static"]
            }
            Self::WatchosArm32 => &["watchos", "arm", "static"],
            Self::WatchosX64 => &["watchos", "x64", "static"],
            Self::TvosArm64 | Self::TvosSimulatorArm64 => &["tvos", "arm64", "static"],
            Self::TvosX64 => &["tvos", "x64", "static"],
            Self::AndroidNativeArm64 => &["android", "arm64", "static"],
            Self::AndroidNativeArm32 => &["android", "arm", "static"],
            Self::AndroidNativeX64 => &["android", "x64", "static"],
            Self::AndroidNativeX86 => &["android", "x86", "static"],
            Self::MacosArm64 => &["osx", "arm64", "static"],
            Self::MacosX64 => &["osx", "x64", "static"],
            Self::LinuxArm64 => &["linux", "arm64", "static"],
            Self::LinuxX64 => &["linux", "x64", "static"],
            Self::MingwX64 => &["mingw", "windows", "x64", "static"],
            Self::WindowsX64 => &["windows", "x64", "static"],
            Self::Wasm32 => &["emscripten", "wasm32", "static"],
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildTarget {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|target| target.name() == s)
            .ok_or_else(|| PackageError::UnknownTarget(s.to_string()))
    }
}
