use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use url::Url;

use crate::error::ScrapeError;
use crate::record::StoredImage;
use crate::settings::Settings;

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Downloads product images into the staging directory and later promotes
/// them into the permanent products directory.
pub struct ImageStore {
    client: Client,
    public_dir: PathBuf,
    staging_dir: String,
    products_dir: String,
    default_ext: String,
}

impl ImageStore {
    /// Create the staging directory (once) and return a store writing into it.
    pub async fn open(client: Client, settings: &Settings) -> Result<Self, ScrapeError> {
        let store = Self {
            client,
            public_dir: settings.public_dir.clone(),
            staging_dir: settings.staging_dir.clone(),
            products_dir: settings.products_dir.clone(),
            default_ext: settings.default_image_ext.clone(),
        };
        let staging = store.staging_path();
        if let Err(e) = tokio::fs::create_dir_all(&staging).await {
            warn!("Failed to create {}: {}", staging.display(), e);
            return Err(e.into());
        }
        Ok(store)
    }

    pub fn staging_path(&self) -> PathBuf {
        self.public_dir.join(&self.staging_dir)
    }

    pub fn products_path(&self) -> PathBuf {
        self.public_dir.join(&self.products_dir)
    }

    /// Download every URL in order, one at a time.
    ///
    /// A failed image is logged and left out; it never aborts the batch.
    pub async fn acquire(&self, urls: &[String], title: &str) -> Vec<StoredImage> {
        let stem = sanitize_title(title);
        let mut stored = Vec::with_capacity(urls.len());

        for url in urls {
            match self.download(url, &stem).await {
                Ok(image) => stored.push(image),
                Err(e) => warn!("Image download failed for {}: {:#}", url, e),
            }
        }

        info!("Stored {}/{} images for {:?}", stored.len(), urls.len(), title);
        stored
    }

    async fn download(&self, url: &str, stem: &str) -> Result<StoredImage> {
        let ext = extension_from_url(url).unwrap_or_else(|| self.default_ext.clone());
        // Sampled per image so files sharing a stem still get distinct names.
        let name = file_name(chrono::Utc::now().timestamp_millis(), stem, &ext);
        let path = self.staging_path().join(&name);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .context("request failed")?;

        write_body(response, &path).await?;

        Ok(StoredImage {
            source_url: url.to_string(),
            local_path: Some(relative_path(&self.staging_dir, &name)),
        })
    }

    /// Move a staged image into the products directory, keeping its name.
    ///
    /// Returns the destination path relative to the public directory. A missing
    /// source is not an error: nothing is moved and the destination is still returned.
    pub async fn promote(&self, file_name: &str) -> Result<String> {
        let file_name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Not a file name: {:?}", file_name))?;

        let dest_dir = self.products_path();
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .with_context(|| format!("Failed to create {}", dest_dir.display()))?;

        let source = self.staging_path().join(file_name);
        let dest = dest_dir.join(file_name);
        let relative = relative_path(&self.products_dir, file_name);

        if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
            warn!("Staged image {} not found, nothing to move", source.display());
            return Ok(relative);
        }

        tokio::fs::rename(&source, &dest)
            .await
            .with_context(|| format!("Failed to move {} to {}", source.display(), dest.display()))?;
        info!("Promoted {} -> {}", source.display(), dest.display());
        Ok(relative)
    }
}

/// Stream the body into a new file at `path`.
///
/// An existing file is never overwritten or removed. A partial file is only
/// cleaned up when it was created by this call.
async fn write_body(mut response: reqwest::Response, path: &Path) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let written = async {
        while let Some(chunk) = response.chunk().await.context("body stream failed")? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        anyhow::Ok(())
    }
    .await;

    if written.is_err() {
        let _ = tokio::fs::remove_file(path).await;
    }
    written
}

/// Drop characters that are illegal in file names and turn whitespace runs into `_`.
pub fn sanitize_title(title: &str) -> String {
    let cleaned = ILLEGAL_CHARS_RE.replace_all(title, "");
    WHITESPACE_RE.replace_all(&cleaned, "_").into_owned()
}

/// Extension of the last path segment, without the dot. Query and fragment are ignored.
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.last()?;
    let (base, ext) = last.rsplit_once('.')?;
    if base.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn file_name(stamp_ms: i64, stem: &str, ext: &str) -> String {
    format!("{}_{}.{}", stamp_ms, stem, ext)
}

fn relative_path(dir: &str, file_name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file_name)
}
