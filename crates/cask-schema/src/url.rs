//! Download URL templates.
//!
//! A template is stored as an explicit pair: the raw string and the name of
//! the key substituted into it. In TOML the common form is a plain string
//! using the `version` key:
//!
//! ```toml
//! url = "https://example.com/App-{{version}}.dmg"
//! ```
//!
//! and the explicit form is a table:
//!
//! ```toml
//! url = { template = "https://example.com/App-{{v}}.dmg", key = "v" }
//! ```
//!
//! Both `{{key}}` and `#{key}` are recognized as placeholders.

use serde::{Deserialize, Serialize};

use crate::{ManifestError, Version};

/// Substitution key used when a template is written as a plain string.
pub const DEFAULT_KEY: &str = "version";

/// A download URL with an explicit substitution point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTemplate", into = "RawTemplate")]
pub struct UrlTemplate {
    /// The raw template string.
    pub template: String,
    /// Name of the key substituted into `template`.
    pub key: String,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTemplate {
    Plain(String),
    Table {
        template: String,
        #[serde(default = "default_key")]
        key: String,
    },
}

fn default_key() -> String {
    DEFAULT_KEY.to_string()
}

impl From<RawTemplate> for UrlTemplate {
    fn from(raw: RawTemplate) -> Self {
        match raw {
            RawTemplate::Plain(template) => Self::new(template),
            RawTemplate::Table { template, key } => Self { template, key },
        }
    }
}

impl From<UrlTemplate> for RawTemplate {
    fn from(t: UrlTemplate) -> Self {
        if t.key == DEFAULT_KEY {
            RawTemplate::Plain(t.template)
        } else {
            RawTemplate::Table {
                template: t.template,
                key: t.key,
            }
        }
    }
}

impl UrlTemplate {
    /// Create a template substituting the `version` key.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            key: DEFAULT_KEY.to_string(),
        }
    }

    /// Placeholders recognized for this template's key.
    pub fn placeholders(&self) -> [String; 2] {
        [
            format!("{{{{{}}}}}", self.key),
            format!("#{{{}}}", self.key),
        ]
    }

    /// True when the template contains at least one substitution point.
    pub fn has_placeholder(&self) -> bool {
        self.placeholders()
            .iter()
            .any(|p| self.template.contains(p.as_str()))
    }

    /// Substitute `version` into the template and check the result is a
    /// usable HTTP(S) URL.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::UnresolvableTemplate`] when the template has
    /// no placeholder for its key, the version is empty, a foreign
    /// placeholder is left behind, or the result is not a valid URL.
    pub fn resolve(&self, version: &Version) -> Result<String, ManifestError> {
        let fail = |reason: String| ManifestError::UnresolvableTemplate {
            template: self.template.clone(),
            reason,
        };

        if !self.has_placeholder() {
            return Err(fail(format!("no {{{{{}}}}} placeholder", self.key)));
        }
        if version.is_empty() {
            return Err(fail("version is empty".to_string()));
        }

        let mut resolved = self.template.clone();
        for placeholder in self.placeholders() {
            resolved = resolved.replace(&placeholder, version.as_str());
        }

        if resolved.contains("{{") || resolved.contains("#{") {
            return Err(fail("unknown placeholder left after substitution".to_string()));
        }
        check_http_url(&resolved).map_err(|reason| fail(reason.to_string()))?;
        Ok(resolved)
    }
}

impl std::fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.template)
    }
}

/// Minimal syntactic check for an absolute HTTP(S) URL.
///
/// Returns the host on success.
///
/// # Errors
///
/// Returns a short reason when the scheme is not `http`/`https`, the host is
/// missing or malformed, or the URL contains whitespace or control characters.
pub fn check_http_url(url: &str) -> Result<&str, &'static str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or("must start with http:// or https://")?;

    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("contains whitespace or control characters");
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, h)| h)
        .split(':')
        .next()
        .unwrap_or_default();

    if host.is_empty() {
        return Err("missing host");
    }
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'))
    {
        return Err("malformed host");
    }
    Ok(host)
}
