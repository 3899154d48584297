//! Media sink
//!
//! Downloads a note's binary assets into `media_root/{user_id}/{note_id}/`,
//! naming files by their source order. A single failed asset is logged and
//! skipped; it never aborts the note or the batch.

use std::path::{Path, PathBuf};

use crate::config::MediaFilter;
use crate::error::Result;
use crate::types::{Note, NoteKind};

/// Downloader for note media assets
pub struct MediaSink {
    client: reqwest::Client,
    root: PathBuf,
}

impl MediaSink {
    /// Build a sink writing under `root`, reusing the API's HTTP client
    pub fn new(client: reqwest::Client, root: PathBuf) -> Self {
        Self { client, root }
    }

    /// Download the note's assets permitted by the filter
    ///
    /// Video notes contribute their cover frame and video streams; standard
    /// notes contribute their images. Returns the number of files written.
    pub async fn download(&self, note: &Note, filter: MediaFilter) -> Result<usize> {
        let dir = self.root.join(&note.user_id).join(&note.note_id);
        tokio::fs::create_dir_all(&dir).await?;

        let mut saved = 0;

        if note.kind == NoteKind::Video && filter.includes_video() {
            if !note.video_cover_url.is_empty() {
                saved += self
                    .save_asset(&note.video_cover_url, &dir, "cover", "jpg")
                    .await;
            }
            for (i, url) in note.video_urls.iter().enumerate() {
                saved += self
                    .save_asset(url, &dir, &format!("video_{i}"), "mp4")
                    .await;
            }
        }

        if note.kind == NoteKind::Normal && filter.includes_image() {
            for (i, url) in note.image_urls.iter().enumerate() {
                saved += self
                    .save_asset(url, &dir, &format!("image_{i}"), "jpg")
                    .await;
            }
        }

        tracing::info!(note_id = %note.note_id, files = saved, dir = %dir.display(), "downloaded media");
        Ok(saved)
    }

    /// Fetch one asset and write it; returns 1 on success, 0 on failure
    async fn save_asset(&self, url: &str, dir: &Path, stem: &str, fallback_ext: &str) -> usize {
        let path = dir.join(format!("{stem}.{}", extension_of(url, fallback_ext)));
        match self.fetch_to_file(url, &path).await {
            Ok(()) => 1,
            Err(e) => {
                tracing::warn!(url, path = %path.display(), error = %e, "asset download failed, skipping");
                0
            }
        }
    }

    async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<()> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        tokio::fs::write(path, &bytes).await?;
        Ok(())
    }
}

/// File extension from the URL path, or the fallback when it has none
fn extension_of(asset_url: &str, fallback: &str) -> String {
    url::Url::parse(asset_url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string())
}
