use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// URL prefix the media directory is served under.
pub const MEDIA_URL: &str = "/media/";

/// Directory inside the media root that post images go to.
const POSTS_DIR: &str = "posts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Gif,
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Detects the format from the file's magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

/// An uploaded image that passed format detection.
#[derive(Debug, Clone)]
pub struct Image {
    pub format: ImageFormat,
    pub bytes: Bytes,
}

/// Uploaded files on disk, addressed by paths relative to the root.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a post image under a fresh name and returns its relative path.
    pub async fn save_post_image(&self, image: &Image) -> anyhow::Result<String> {
        let dir = self.root.join(POSTS_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating media directory {}", dir.display()))?;

        let name = format!("{}.{}", Uuid::new_v4(), image.format.extension());
        let file_path = dir.join(&name);
        let mut file = tokio::fs::File::create(&file_path)
            .await
            .with_context(|| format!("creating {}", file_path.display()))?;
        file.write_all(&image.bytes)
            .await
            .with_context(|| format!("writing {}", file_path.display()))?;
        file.flush().await?;

        info!("Saved image {} ({} bytes)", file_path.display(), image.bytes.len());
        Ok(format!("{}/{}", POSTS_DIR, name))
    }

    /// Removes a stored file. Failures are logged, not returned.
    pub async fn discard(&self, relative: &str) {
        let path = self.root.join(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("Removed unreferenced image {}", path.display()),
            Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
}

/// Public URL of a stored file.
pub fn url_for(relative: &str) -> String {
    format!("{}{}", MEDIA_URL, relative)
}
