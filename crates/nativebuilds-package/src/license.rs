use crate::{PackageError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Licenses the published artifacts may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum License {
    #[serde(rename = "Apache-2.0")]
    Apache2,
    #[serde(rename = "BSD-2-Clause")]
    Bsd2,
    #[serde(rename = "BSD-3-Clause")]
    Bsd3,
    #[serde(rename = "MIT")]
    Mit,
    #[serde(rename = "MIT-CMU")]
    MitCmu,
    #[serde(rename = "curl")]
    Curl,
    #[serde(rename = "Zlib")]
    Zlib,
}

impl License {
    pub const ALL: [License; 7] = [
        Self::Apache2,
        Self::Bsd2,
        Self::Bsd3,
        Self::Mit,
        Self::MitCmu,
        Self::Curl,
        Self::Zlib,
    ];

    /// SPDX identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::Apache2 => "Apache-2.0",
            Self::Bsd2 => "BSD-2-Clause",
            Self::Bsd3 => "BSD-3-Clause",
            Self::Mit => "MIT",
            Self::MitCmu => "MIT-CMU",
            Self::Curl => "curl",
            Self::Zlib => "Zlib",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Apache2 => "The Apache Software License, Version 2.0",
            Self::Bsd2 => "BSD 2-Clause",
            Self::Bsd3 => "BSD 3-Clause",
            Self::Mit => "The MIT License",
            Self::MitCmu => "CMU License",
            Self::Curl => "curl License",
            Self::Zlib => "zlib License",
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Self::Apache2 => "https://www.apache.org/licenses/LICENSE-2.0.txt",
            Self::Bsd2 => "https://opensource.org/license/BSD-2-Clause",
            Self::Bsd3 => "https://opensource.org/license/BSD-3-Clause",
            Self::Mit => "https://opensource.org/license/mit",
            Self::MitCmu => "https://spdx.org/licenses/MIT-CMU.html",
            Self::Curl => "https://spdx.org/licenses/curl.html",
            Self::Zlib => "https://www.zlib.net/zlib_license.html",
        }
    }

    /// Resolve a manifest license id.
    ///
    /// Compound SPDX expressions fall back to their first alternative
    /// (`"MIT OR Apache-2.0"` → MIT).
    pub fn from_id(id: &str) -> Result<Self> {
        Self::find(id)
            .or_else(|| {
                let first = id.split(" OR ").next().unwrap_or(id);
                let first = first.split(" AND ").next().unwrap_or(first);
                Self::find(first)
            })
            .ok_or_else(|| PackageError::LicenseNotFound(id.to_string()))
    }

    fn find(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|license| license.id() == id)
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MIT", License::Mit)]
    #[case("MIT OR Apache-2.0", License::Mit)]
    #[case("Apache-2.0 AND MIT", License::Apache2)]
    #[case("BSD-3-Clause OR GPL-2.0-only", License::Bsd3)]
    #[case("curl", License::Curl)]
    #[case("Zlib", License::Zlib)]
    #[case("MIT-CMU", License::MitCmu)]
    fn test_from_id(#[case] id: &str, #[case] expected: License) {
        assert_eq!(License::from_id(id).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("GPL-3.0-only")]
    #[case("GPL-2.0-only OR MIT")]
    fn test_unknown_license_is_error(#[case] id: &str) {
        assert!(matches!(
            License::from_id(id),
            Err(PackageError::LicenseNotFound(_))
        ));
    }

    #[test]
    fn test_serialized_as_spdx_id() {
        for license in License::ALL {
            let json = serde_json::to_string(&license).unwrap();
            assert_eq!(json, format!("\"{}\"", license.id()));
        }
    }
}
