//! TOML cask manifest definition.
//!
//! ```toml
//! [cask]
//! token = "skype"
//! name = "Skype"
//! version = "8.34.0.78"
//! homepage = "https://www.skype.com/"
//! auto_updates = true
//!
//! [source]
//! url = "https://example.com/Skype-{{version}}.dmg"
//! sha256 = "814b60d8…"
//! appcast = "https://example.com/update-feed"
//!
//! [install]
//! app = "Skype.app"
//!
//! [zap]
//! trash = ["~/Library/Caches/com.skype.skype"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::url::check_http_url;
use crate::{
    Checksum, HashAlgorithm, ManifestError, Token, UrlTemplate, ValidationReport, Version,
    ZapStanza,
};

/// Identity and display metadata, the `[cask]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaskInfo {
    /// Unique token within a manifest collection.
    pub token: Token,
    /// Human-readable product name.
    pub name: String,
    /// Version substituted into the download URL.
    pub version: Version,
    /// Product homepage (informational).
    pub homepage: String,
    /// One-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// The application updates itself outside the package manager.
    #[serde(default)]
    pub auto_updates: bool,
}

/// Acquisition data, the `[source]` table.
///
/// Exactly one of `sha256`, `sha512` or `blake3` must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSource", into = "RawSource")]
pub struct Source {
    /// Download URL template.
    pub url: UrlTemplate,
    /// Expected digest of the downloaded artifact.
    pub checksum: Checksum,
    /// Optional update feed polled to detect new releases.
    pub appcast: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct RawSource {
    url: UrlTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha512: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blake3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    appcast: Option<String>,
}

impl TryFrom<RawSource> for Source {
    type Error = ManifestError;

    fn try_from(raw: RawSource) -> Result<Self, Self::Error> {
        let mut declared = [
            (HashAlgorithm::Sha256, raw.sha256),
            (HashAlgorithm::Sha512, raw.sha512),
            (HashAlgorithm::Blake3, raw.blake3),
        ]
        .into_iter()
        .filter_map(|(algorithm, value)| value.map(|v| Checksum::new(algorithm, v)));

        let checksum = match (declared.next(), declared.next()) {
            (Some(c), None) => c,
            (None, _) => return Err(ManifestError::MissingField("source.sha256".to_string())),
            (Some(_), Some(_)) => {
                return Err(ManifestError::InvalidChecksum(
                    "declare exactly one of sha256, sha512 or blake3".to_string(),
                ));
            }
        };

        Ok(Self {
            url: raw.url,
            checksum,
            appcast: raw.appcast,
        })
    }
}

impl From<Source> for RawSource {
    fn from(s: Source) -> Self {
        let value = Some(s.checksum.value().to_string());
        let (sha256, sha512, blake3) = match s.checksum.algorithm() {
            HashAlgorithm::Sha256 => (value, None, None),
            HashAlgorithm::Sha512 => (None, value, None),
            HashAlgorithm::Blake3 => (None, None, value),
        };
        Self {
            url: s.url,
            sha256,
            sha512,
            blake3,
            appcast: s.appcast,
        }
    }
}

/// Install behavior, the `[install]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSpec {
    /// Name of the `.app` bundle placed in the applications directory.
    pub app: String,
}

/// A complete cask manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaskManifest {
    /// Identity and display metadata.
    pub cask: CaskInfo,
    /// Download location, digest and update feed.
    pub source: Source,
    /// Installed artifact.
    pub install: InstallSpec,
    /// Paths removed on full uninstall.
    #[serde(default, skip_serializing_if = "ZapStanza::is_empty")]
    pub zap: ZapStanza,
}

impl CaskManifest {
    /// Parse a manifest from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be read, or any
    /// error from [`CaskManifest::parse`].
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a manifest from a TOML string.
    ///
    /// Only the shape is checked here; call [`CaskManifest::validate`] for
    /// the full schema check.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingField`] when a required key is
    /// absent, or [`ManifestError::Parse`] for any other TOML problem.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        toml::from_str(content).map_err(ManifestError::from_toml)
    }

    /// Serialize this manifest to a pretty-printed TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `toml::ser::Error` if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// The manifest's token.
    pub fn token(&self) -> &Token {
        &self.cask.token
    }

    /// The manifest's version.
    pub fn version(&self) -> &Version {
        &self.cask.version
    }

    /// Resolve the download URL with the manifest's version.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::UnresolvableTemplate`] when the template
    /// cannot be resolved.
    pub fn download_url(&self) -> Result<String, ManifestError> {
        self.source.url.resolve(&self.cask.version)
    }

    /// Confirm required fields are present and every value is well-formed.
    ///
    /// All problems are collected rather than stopping at the first.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationReport`] listing every problem found.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let mut issues = Vec::new();
        let info = &self.cask;

        if info.token.is_empty() {
            issues.push(ManifestError::MissingField("cask.token".to_string()));
        } else if let Err(e) = info.token.check() {
            issues.push(e);
        }
        if info.name.trim().is_empty() {
            issues.push(ManifestError::MissingField("cask.name".to_string()));
        }
        if info.version.is_empty() {
            issues.push(ManifestError::MissingField("cask.version".to_string()));
        }
        if info.homepage.trim().is_empty() {
            issues.push(ManifestError::MissingField("cask.homepage".to_string()));
        } else if check_http_url(&info.homepage).is_err() {
            issues.push(ManifestError::InvalidUrl {
                field: "cask.homepage",
                url: info.homepage.clone(),
            });
        }

        if self.source.url.template.trim().is_empty() {
            issues.push(ManifestError::MissingField("source.url".to_string()));
        } else if !info.version.is_empty() {
            if let Err(e) = self.download_url() {
                issues.push(e);
            }
        }
        if let Err(e) = self.source.checksum.check() {
            issues.push(e);
        }
        if let Some(feed) = &self.source.appcast {
            if check_http_url(feed).is_err() {
                issues.push(ManifestError::InvalidUrl {
                    field: "source.appcast",
                    url: feed.clone(),
                });
            }
        }

        let app = self.install.app.trim();
        if app.is_empty() {
            issues.push(ManifestError::MissingField("install.app".to_string()));
        } else if !app.ends_with(".app") || app.len() == ".app".len() || app.contains('/') {
            issues.push(ManifestError::InvalidArtifact(app.to_string()));
        }

        issues.extend(self.zap.problems());

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport {
                token: info.token.to_string(),
                issues,
            })
        }
    }
}

impl std::str::FromStr for CaskManifest {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
