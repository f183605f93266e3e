//! Errors raised while loading or validating a manifest.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading, parsing or validating a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// An I/O error occurred while reading a manifest file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be deserialized into a manifest.
    #[error("Parse error: {0}")]
    Parse(toml::de::Error),

    /// A required attribute is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The download URL template cannot be resolved with the version.
    #[error("cannot resolve URL template '{template}': {reason}")]
    UnresolvableTemplate {
        /// The raw template string.
        template: String,
        /// Why resolution failed.
        reason: String,
    },

    /// The declared checksum is not a well-formed digest.
    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    /// The token contains characters outside the allowed set.
    #[error("invalid token '{0}': use lowercase letters, digits, '-', '@' or '.'")]
    InvalidToken(String),

    /// A URL-valued field is malformed or uses an unsupported scheme.
    #[error("invalid URL in {field}: '{url}'")]
    InvalidUrl {
        /// Dotted field name (e.g. `cask.homepage`).
        field: &'static str,
        /// The offending value.
        url: String,
    },

    /// The installed artifact name is not an `.app` bundle name.
    #[error("invalid app artifact '{0}': expected a bundle name ending in .app")]
    InvalidArtifact(String),

    /// A zap entry is not a usable path pattern.
    #[error("invalid zap path '{pattern}': {reason}")]
    InvalidZapPath {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two manifests in one collection share a token.
    #[error("duplicate token '{token}' in {} and {}", first.display(), second.display())]
    DuplicateToken {
        /// The shared token.
        token: String,
        /// The manifest that was loaded first.
        first: PathBuf,
        /// The manifest that collided with it.
        second: PathBuf,
    },
}

const SERDE_MISSING_PREFIX: &str = "missing field `";
const MISSING_PREFIX: &str = "missing required field: ";

impl ManifestError {
    /// Map a TOML error, surfacing absent keys as [`ManifestError::MissingField`].
    pub fn from_toml(err: toml::de::Error) -> Self {
        let message = err.message();
        if let Some(rest) = message.strip_prefix(SERDE_MISSING_PREFIX) {
            let field = rest.split('`').next().unwrap_or_default();
            return Self::MissingField(field.to_string());
        }
        if let Some(field) = message.strip_prefix(MISSING_PREFIX) {
            return Self::MissingField(field.trim().to_string());
        }
        Self::Parse(err)
    }

    /// True for errors describing an absent attribute.
    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingField(_))
    }
}

impl From<toml::de::Error> for ManifestError {
    fn from(err: toml::de::Error) -> Self {
        Self::from_toml(err)
    }
}

/// Every problem found in a single manifest by
/// [`CaskManifest::validate`](crate::CaskManifest::validate).
#[derive(Debug)]
pub struct ValidationReport {
    /// Token of the manifest under inspection.
    pub token: String,
    /// The individual problems, in field order.
    pub issues: Vec<ManifestError>,
}

impl ValidationReport {
    /// Number of problems found.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// True when no problems were recorded.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} problem(s) in '{}'", self.issues.len(), self.token)?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Needs {
        token: String,
    }

    #[test]
    fn serde_missing_field_is_mapped() {
        let err = toml::from_str::<Needs>("other = 1").unwrap_err();
        match ManifestError::from_toml(err) {
            ManifestError::MissingField(f) => assert_eq!(f, "token"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn syntax_errors_stay_parse_errors() {
        let err = toml::from_str::<Needs>("this is not toml {{{").unwrap_err();
        assert!(matches!(ManifestError::from_toml(err), ManifestError::Parse(_)));
    }

    #[test]
    fn report_lists_every_issue() {
        let report = ValidationReport {
            token: "skype".into(),
            issues: vec![
                ManifestError::MissingField("cask.name".into()),
                ManifestError::InvalidToken("Sky pe".into()),
            ],
        };
        let text = report.to_string();
        assert!(text.starts_with("2 problem(s) in 'skype'"));
        assert!(text.contains("cask.name"));
        assert!(text.contains("Sky pe"));
    }
}
