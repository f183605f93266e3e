//! Identifier newtypes shared by manifests: [`Token`] and [`Version`].

use std::borrow::Borrow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::ManifestError;

/// A normalized cask token (the unique identifier of a manifest).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Create a new token, normalizing the input to lowercase.
    ///
    /// The character set is not checked here; see [`Token::check`].
    pub fn new(token: &str) -> Self {
        Self(token.trim().to_lowercase())
    }

    /// Create a token and reject it unless it passes [`Token::check`].
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidToken`] for empty tokens or tokens
    /// containing characters outside `[a-z0-9-@.]`.
    pub fn validated(token: &str) -> Result<Self, ManifestError> {
        let t = Self::new(token);
        t.check()?;
        Ok(t)
    }

    /// Check the token's character set.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidToken`] when the token is empty, does
    /// not start with an alphanumeric, or contains other characters than
    /// lowercase letters, digits, `-`, `@` and `.`.
    pub fn check(&self) -> Result<(), ManifestError> {
        let starts_ok = self
            .0
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric());
        let chars_ok = self
            .0
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '@' | '.'));
        if starts_ok && chars_ok {
            Ok(())
        } else {
            Err(ManifestError::InvalidToken(self.0.clone()))
        }
    }

    /// Return the normalized token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for Token {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<Token> for String {
    fn from(t: Token) -> Self {
        t.0
    }
}

/// An opaque version string.
///
/// Versions are compared segment by segment (split on `.`, `-`, `_` and
/// `,`). Numeric segments compare as numbers and rank above a missing
/// segment, which in turn ranks above a textual tag. So `8.34.0.78` sorts
/// before `8.35.0.1`, `1.0.0-beta` before `1.0.0`, and `1.0.0` before
/// `1.0.0.0`. Strings with identical segments fall back to byte order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

/// Variant order is the ranking: tags < end of version < numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Segment<'a> {
    Tag(&'a str),
    End,
    Number(u64),
}

impl<'a> Segment<'a> {
    fn parse(raw: &'a str) -> Self {
        raw.parse().map_or(Segment::Tag(raw), Segment::Number)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        fn padded<'a>(segs: &[Segment<'a>], i: usize) -> Segment<'a> {
            segs.get(i).copied().unwrap_or(Segment::End)
        }
        let left = self.segments();
        let right = other.segments();
        (0..left.len().max(right.len()))
            .map(|i| padded(&left, i).cmp(&padded(&right, i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Version {
    fn segments(&self) -> Vec<Segment<'_>> {
        self.0.split(['.', '-', '_', ',']).map(Segment::parse).collect()
    }

    /// Create a new version from the given string (stored as-is).
    pub fn new(v: &str) -> Self {
        Self(v.to_string())
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the version string is empty or whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for Version {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for Version {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for Version {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
