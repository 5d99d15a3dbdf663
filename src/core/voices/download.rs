//! Streaming downloads with atomic placement.

use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::{AppError, AppResult};
use crate::utils::atomic_file::temp_sibling;

/// Fetches remote files into the asset tree.
///
/// The body is streamed into a unique `<dest>.<uuid>.part` sibling and renamed
/// over `dest` only once the transfer completed, so an interrupted download
/// never leaves anything at the final path.
#[derive(Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn download(&self, url: &Url, dest: &Path) -> AppResult<()> {
        let failed = |reason: String| AppError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| failed(format!("cannot create {}: {e}", parent.display())))?;
        }

        info!(url = %url, dest = %dest.display(), "Downloading voice asset");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| failed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let tmp = temp_sibling(dest);
        let result = async {
            let mut file = fs::File::create(&tmp)
                .await
                .map_err(|e| failed(format!("cannot create {}: {e}", tmp.display())))?;

            let mut written: u64 = 0;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| failed(format!("transfer interrupted: {e}")))?
            {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| failed(format!("write failed: {e}")))?;
                written += chunk.len() as u64;
            }

            file.sync_all()
                .await
                .map_err(|e| failed(format!("sync failed: {e}")))?;
            drop(file);

            fs::rename(&tmp, dest)
                .await
                .map_err(|e| failed(format!("cannot move into place: {e}")))?;

            Ok(written)
        }
        .await;

        match result {
            Ok(written) => {
                debug!(bytes = written, dest = %dest.display(), "Download complete");
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&tmp).await {
                    warn!(
                        path = %tmp.display(),
                        error = %cleanup,
                        "Could not remove partial download"
                    );
                }
                Err(e)
            }
        }
    }
}
