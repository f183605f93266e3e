//! Async download with streaming checksum verification.
//!
//! Bytes are written to a `.part` file and hashed as they arrive; the file is
//! only renamed into place once its digest matches the manifest.

use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use cask_schema::{CaskManifest, Checksum, ManifestError, Token, Version};

use crate::Reporter;
use crate::io::hash::{Hasher, hash_file};
use crate::paths::Layout;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// Request for a download operation
pub struct DownloadRequest<'a, R: Reporter + ?Sized> {
    pub client: &'a Client,
    pub token: &'a Token,
    pub version: &'a Version,
    pub url: &'a str,
    pub dest: &'a Path,
    pub checksum: &'a Checksum,
    pub reporter: &'a R,
}

impl<R: Reporter + ?Sized> std::fmt::Debug for DownloadRequest<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("token", self.token)
            .field("url", &self.url)
            .field("dest", &self.dest)
            .finish_non_exhaustive()
    }
}

impl<R: Reporter + ?Sized> DownloadRequest<'_, R> {
    /// Stream the URL to `dest`, verifying the digest. Returns the hex digest.
    pub async fn execute(self) -> Result<String, DownloadError> {
        let partial = part_path(self.dest);

        let response = self
            .client
            .get(self.url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        let total_size = response.content_length();
        self.reporter
            .downloading(self.token, self.version, 0, total_size);

        if let Some(parent) = self.dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let (actual, downloaded) = self
            .receive(response.bytes_stream(), &partial, total_size)
            .await?;

        if !self.checksum.matches(&actual) {
            self.reporter
                .failed(self.token, self.version, "checksum mismatch");
            tokio::fs::remove_file(&partial).await.ok();
            return Err(DownloadError::ChecksumMismatch {
                expected: self.checksum.value().to_string(),
                actual,
            });
        }

        if let Err(e) = tokio::fs::rename(&partial, self.dest).await {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(e.into());
        }
        tracing::debug!(url = self.url, bytes = downloaded, "download verified");
        Ok(actual)
    }

    /// Write `stream` to `partial`, hashing as it goes. Returns the hex
    /// digest and byte count. On any error the partial file is removed.
    async fn receive<S, C, E>(
        &self,
        stream: S,
        partial: &Path,
        total_size: Option<u64>,
    ) -> Result<(String, u64), DownloadError>
    where
        S: Stream<Item = Result<C, E>>,
        C: AsRef<[u8]>,
        DownloadError: From<E>,
    {
        let result = self.write_partial(stream, partial, total_size).await;
        if result.is_err() {
            tokio::fs::remove_file(partial).await.ok();
        }
        result
    }

    async fn write_partial<S, C, E>(
        &self,
        stream: S,
        partial: &Path,
        total_size: Option<u64>,
    ) -> Result<(String, u64), DownloadError>
    where
        S: Stream<Item = Result<C, E>>,
        C: AsRef<[u8]>,
        DownloadError: From<E>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut file = File::create(partial).await?;
        let mut hasher = Hasher::new(self.checksum.algorithm());
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let chunk = chunk.as_ref();
            file.write_all(chunk).await?;
            hasher.update(chunk);
            downloaded += chunk.len() as u64;
            self.reporter
                .downloading(self.token, self.version, downloaded, total_size);
        }

        file.flush().await?;
        Ok((hasher.finalize_hex(), downloaded))
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Fetch a manifest's artifact into the download cache.
///
/// A cached file whose digest already matches is reused without touching
/// the network.
pub async fn fetch<R: Reporter + ?Sized>(
    client: &Client,
    layout: &Layout,
    manifest: &CaskManifest,
    reporter: &R,
) -> Result<PathBuf, DownloadError> {
    let url = manifest.download_url()?;
    let checksum = &manifest.source.checksum;
    checksum.check()?;

    let dest = layout.cached_download(manifest.token(), manifest.version(), &url);

    if dest.exists() {
        let cached = dest.clone();
        let algorithm = checksum.algorithm();
        let digest = tokio::task::spawn_blocking(move || hash_file(&cached, algorithm))
            .await
            .map_err(std::io::Error::other)??;
        if checksum.matches(&digest) {
            tracing::debug!(path = %dest.display(), "using cached download");
            return Ok(dest);
        }
        tracing::warn!(path = %dest.display(), "cached download is stale, fetching again");
        tokio::fs::remove_file(&dest).await?;
    }

    DownloadRequest {
        client,
        token: manifest.token(),
        version: manifest.version(),
        url: &url,
        dest: &dest,
        checksum,
        reporter,
    }
    .execute()
    .await?;

    Ok(dest)
}
