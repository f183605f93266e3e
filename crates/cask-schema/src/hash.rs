//! Checksum declarations: the digest algorithm and its expected hex value.

use serde::{Deserialize, Serialize};

use crate::ManifestError;

/// Digest algorithms a manifest may declare for its download artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (64 hex characters). The common case.
    #[default]
    Sha256,
    /// SHA-512 (128 hex characters).
    Sha512,
    /// BLAKE3 with the default 32-byte output (64 hex characters).
    Blake3,
}

impl HashAlgorithm {
    /// All supported algorithms, in the order manifests are checked for them.
    pub const ALL: [HashAlgorithm; 3] = [Self::Sha256, Self::Sha512, Self::Blake3];

    /// Length of a hex-encoded digest for this algorithm.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Blake3 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Manifest key naming this algorithm (`sha256`, `sha512`, `blake3`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ManifestError::InvalidChecksum(format!("unknown algorithm '{s}'")))
    }
}

/// The expected digest of a download artifact.
///
/// Manifests are parsed leniently so that [`Checksum::check`] can report
/// malformed values alongside other problems; use [`Checksum::validated`]
/// when constructing one by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum {
    algorithm: HashAlgorithm,
    value: String,
}

impl Checksum {
    /// Create a checksum without validation, lowercasing the hex value.
    pub fn new(algorithm: HashAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into().trim().to_ascii_lowercase(),
        }
    }

    /// Create a checksum and confirm it is a well-formed digest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidChecksum`] if `value` is not exactly
    /// [`HashAlgorithm::digest_len`] ASCII hex characters.
    pub fn validated(algorithm: HashAlgorithm, value: &str) -> Result<Self, ManifestError> {
        let c = Self::new(algorithm, value);
        c.check()?;
        Ok(c)
    }

    /// Confirm the value is a fixed-length hex string for the algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidChecksum`] on a length mismatch or
    /// non-hex characters.
    pub fn check(&self) -> Result<(), ManifestError> {
        let expected = self.algorithm.digest_len();
        if self.value.len() != expected {
            return Err(ManifestError::InvalidChecksum(format!(
                "{}: expected {expected} hex characters, got {}",
                self.algorithm,
                self.value.len()
            )));
        }
        if !self.value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ManifestError::InvalidChecksum(format!(
                "{}: contains non-hex characters",
                self.algorithm
            )));
        }
        Ok(())
    }

    /// The declared algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The lowercase hex digest.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Compare against a computed hex digest, ignoring case.
    pub fn matches(&self, actual: &str) -> bool {
        self.value.eq_ignore_ascii_case(actual)
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}
