//! Resumable single-file downloads.

use std::path::Path;

use futures::StreamExt;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::api::RequestContext;
use crate::error::{Error, Result};
use crate::output::progress::download_bar;
use crate::throttle::RetryPolicy;

/// Minimum content length before a progress bar is shown (20 MB).
const PROGRESS_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Result of a download call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Bytes were fetched (fresh or resumed).
    Downloaded,
    /// The destination already existed non-empty and was presumed complete.
    SkippedExisting,
}

/// Downloads one URL to one file with byte-range resume across retries.
///
/// Pre-existing non-empty destinations are presumed complete and skipped
/// without a request, an optimistic policy with no size or hash check.
/// Zero-byte files are indistinguishable from never-started downloads and
/// are re-fetched from scratch. Within a retry loop every attempt recomputes
/// the resume offset from the file's current length, so partial progress is
/// never lost; mid-stream failures keep the partial file on disk.
pub struct ResumableDownloader {
    client: Client,
    ctx: Arc<RequestContext>,
    retry: RetryPolicy,
    show_progress: bool,
}

impl ResumableDownloader {
    pub fn new(
        client: Client,
        ctx: Arc<RequestContext>,
        retry: RetryPolicy,
        show_progress: bool,
    ) -> Self {
        Self {
            client,
            ctx,
            retry,
            show_progress,
        }
    }

    /// Download `url` to `dest`.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<DownloadOutcome> {
        if presumed_complete(dest) {
            tracing::debug!("skipping existing file: {}", dest.display());
            return Ok(DownloadOutcome::SkippedExisting);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.retry
            .run(|| self.attempt(url, dest))
            .await
            .map_err(|e| match e {
                Error::Download(_) => e,
                other => Error::Download(format!("{}: {}", dest.display(), other)),
            })?;

        Ok(DownloadOutcome::Downloaded)
    }

    /// One transfer attempt, resuming from whatever is on disk.
    async fn attempt(&self, url: &str, dest: &Path) -> Result<()> {
        let offset = file_len(dest);

        let mut request = self.client.get(url).headers(self.ctx.headers());
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", offset));
            tracing::debug!("resuming {} from byte {}", dest.display(), offset);
        }

        let response = request.send().await?;
        let status = response.status();

        let resumed = match status {
            StatusCode::PARTIAL_CONTENT => true,
            StatusCode::OK => false,
            StatusCode::RANGE_NOT_SATISFIABLE => {
                // The file already covers the full length.
                tracing::debug!("{} already complete at {} bytes", dest.display(), offset);
                return Ok(());
            }
            other => {
                return Err(Error::Download(format!(
                    "{}: HTTP {}",
                    dest.display(),
                    other
                )));
            }
        };

        let total = response
            .content_length()
            .map(|len| if resumed { len + offset } else { len });

        let progress = total.filter(|t| self.show_progress && *t > PROGRESS_THRESHOLD).map(download_bar);
        if let Some(pb) = &progress {
            if resumed {
                pb.set_position(offset);
            }
        }

        // 200 means the server ignored the range request; start over.
        let mut file = OpenOptions::new()
            .create(true)
            .append(resumed)
            .write(true)
            .truncate(!resumed)
            .open(dest)
            .await?;
        let mut written = if resumed { offset } else { 0 };

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            // A transport error mid-stream keeps the partial file; the next
            // attempt resumes from its length.
            let chunk = chunk.map_err(|e| {
                Error::Download(format!("{}: stream error: {}", dest.display(), e))
            })?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            if let Some(pb) = &progress {
                pb.set_position(written);
            }
        }

        file.flush().await?;
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        tracing::debug!("downloaded {} ({} bytes)", dest.display(), written);
        Ok(())
    }
}

/// Current length of the destination file, zero when absent.
pub fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// The optimistic skip policy: non-empty means complete.
pub fn presumed_complete(path: &Path) -> bool {
    file_len(path) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absent_file_has_zero_offset() {
        let dir = tempdir().unwrap();
        assert_eq!(file_len(&dir.path().join("missing.mp4")), 0);
    }

    #[test]
    fn partial_file_resumes_from_its_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.mp4");
        std::fs::write(&path, vec![0u8; 1234]).unwrap();
        assert_eq!(file_len(&path), 1234);
    }

    #[test]
    fn non_empty_file_is_presumed_complete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("done.mp4");
        std::fs::write(&path, b"data").unwrap();
        assert!(presumed_complete(&path));
    }

    #[test]
    fn zero_byte_file_counts_as_never_started() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.mp4");
        std::fs::write(&path, b"").unwrap();
        assert!(!presumed_complete(&path));
    }

    #[tokio::test]
    async fn existing_file_is_skipped_without_any_request() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("done.mp4");
        std::fs::write(&path, b"already here").unwrap();

        // An unroutable URL: any attempt to fetch would error, so a skip
        // proves no request was made.
        let ctx = Arc::new(RequestContext::new(None, "test-agent").unwrap());
        let downloader = ResumableDownloader::new(
            Client::new(),
            ctx,
            RetryPolicy::new(1, vec![]),
            false,
        );
        let outcome = downloader
            .download("http://127.0.0.1:1/unreachable", &path)
            .await
            .unwrap();
        assert_eq!(outcome, DownloadOutcome::SkippedExisting);
        assert_eq!(std::fs::read(&path).unwrap(), b"already here");
    }

    #[tokio::test]
    async fn unreachable_host_surfaces_download_error_after_retries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.mp4");

        let ctx = Arc::new(RequestContext::new(None, "test-agent").unwrap());
        let downloader = ResumableDownloader::new(
            Client::new(),
            ctx,
            RetryPolicy::new(2, vec![std::time::Duration::from_millis(1)]),
            false,
        );
        let err = downloader
            .download("http://127.0.0.1:1/unreachable", &path)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Download(_)));
    }
}
