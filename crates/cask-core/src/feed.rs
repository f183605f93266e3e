//! Update feed (appcast) checks.
//!
//! Feeds are Sparkle-style XML. Versions are read from the
//! `sparkle:shortVersionString` and `sparkle:version` attributes or
//! elements; the checkpoint is the sha256 of the whole body so callers can
//! tell when a feed changed even if no version could be extracted.

use regex::Regex;
use reqwest::Client;

use cask_schema::{CaskManifest, HashAlgorithm, Version};

use crate::io::download::DownloadError;
use crate::io::hash::hash_bytes;

/// Outcome of polling one appcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedStatus {
    pub url: String,
    /// sha256 of the response body.
    pub checkpoint: String,
    /// Highest version advertised, if any could be parsed.
    pub latest: Option<Version>,
    /// `latest` is newer than the manifest's version.
    pub outdated: bool,
}

/// Fetch and inspect the manifest's appcast. `Ok(None)` when it has none.
pub async fn check_feed(
    client: &Client,
    manifest: &CaskManifest,
) -> Result<Option<FeedStatus>, DownloadError> {
    let Some(url) = manifest.source.appcast.as_deref() else {
        return Ok(None);
    };

    let body = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let checkpoint = hash_bytes(HashAlgorithm::Sha256, &body);
    let text = String::from_utf8_lossy(&body);
    let latest = feed_versions(&text).into_iter().max();
    let outdated = latest.as_ref().is_some_and(|v| v > manifest.version());

    tracing::debug!(%url, ?latest, %checkpoint, "checked appcast");
    Ok(Some(FeedStatus {
        url: url.to_string(),
        checkpoint,
        latest,
        outdated,
    }))
}

/// Every version advertised in a feed body.
///
/// Short version strings are preferred; build numbers are only used when a
/// feed carries no short versions at all.
pub fn feed_versions(body: &str) -> Vec<Version> {
    let short = capture_all(body, "shortVersionString");
    if short.is_empty() {
        capture_all(body, "version")
    } else {
        short
    }
}

fn capture_all(body: &str, key: &str) -> Vec<Version> {
    let pattern = format!(
        r#"sparkle:{key}\s*=\s*["']([^"']+)["']|<sparkle:{key}>\s*([^<\s]+)\s*</sparkle:{key}>"#
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures_iter(body)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| Version::from(m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss xmlns:sparkle="http://www.andymatuschak.org/xml-namespaces/sparkle">
  <channel>
    <item>
      <enclosure url="https://h/Skype-8.35.0.1.dmg" sparkle:version="835001" sparkle:shortVersionString="8.35.0.1"/>
    </item>
    <item>
      <sparkle:shortVersionString>8.34.0.78</sparkle:shortVersionString>
      <sparkle:version>834078</sparkle:version>
    </item>
  </channel>
</rss>"#;

    fn manifest(appcast: Option<&str>) -> CaskManifest {
        let appcast = appcast
            .map(|u| format!("appcast = \"{u}\""))
            .unwrap_or_default();
        CaskManifest::parse(&format!(
            r#"
[cask]
token = "skype"
name = "Skype"
version = "8.34.0.78"
homepage = "https://www.skype.com/"

[source]
url = "https://h/Skype-{{{{version}}}}.dmg"
sha256 = "{}"
{appcast}

[install]
app = "Skype.app"
"#,
            "0".repeat(64)
        ))
        .unwrap()
    }

    #[test]
    fn extracts_short_versions_first() {
        let versions = feed_versions(FEED);
        assert_eq!(
            versions,
            vec![Version::from("8.35.0.1"), Version::from("8.34.0.78")]
        );
    }

    #[test]
    fn falls_back_to_build_numbers() {
        let feed = r#"<enclosure sparkle:version="120"/><enclosure sparkle:version='99'/>"#;
        assert_eq!(feed_versions(feed).into_iter().max(), Some(Version::from("120")));
        assert!(feed_versions("{\"not\":\"sparkle\"}").is_empty());
    }

    #[tokio::test]
    async fn reports_newer_release() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/appcast.xml")
            .with_body(FEED)
            .create_async()
            .await;

        let m = manifest(Some(&format!("{}/appcast.xml", server.url())));
        let status = check_feed(&Client::new(), &m).await.unwrap().unwrap();
        assert_eq!(status.latest, Some(Version::from("8.35.0.1")));
        assert!(status.outdated);
        assert_eq!(
            status.checkpoint,
            hash_bytes(HashAlgorithm::Sha256, FEED.as_bytes())
        );
    }

    #[tokio::test]
    async fn unparseable_feed_is_not_outdated() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/feed")
            .with_body("{}")
            .create_async()
            .await;

        let m = manifest(Some(&format!("{}/feed", server.url())));
        let status = check_feed(&Client::new(), &m).await.unwrap().unwrap();
        assert!(status.latest.is_none());
        assert!(!status.outdated);
    }

    #[tokio::test]
    async fn no_appcast_is_none() {
        assert!(check_feed(&Client::new(), &manifest(None)).await.unwrap().is_none());
    }
}
