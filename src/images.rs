use anyhow::{Context, Result};
use reqwest::Client;
use std::path::PathBuf;
use url::Url;

/// Working directory of images downloaded for the current run.
pub struct ImageCache {
    client: Client,
    dir: PathBuf,
    hosts: Vec<String>,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>, hosts: &[String]) -> Self {
        Self {
            client: Client::new(),
            dir: dir.into(),
            hosts: hosts.iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    /// True if the URL is served by one of the recognized image hosts.
    pub fn is_image_host(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .is_some_and(|host| self.hosts.iter().any(|h| *h == host))
    }

    /// Download an image into the cache, named after the URL's last path segment
    /// inside a subdirectory for `entry_id`, so two entries of one batch never
    /// share a file.
    ///
    /// Returns `None` when the URL is absent, not an image host, the response is
    /// not an image, or the download fails for any reason. Never fatal.
    pub async fn fetch(&self, entry_id: &str, url: Option<&str>) -> Option<PathBuf> {
        let url = url?;
        if !self.is_image_host(url) {
            return None;
        }
        let file_name = file_name_for(url)?;
        let dir = self.dir.join(entry_dir_name(entry_id)?);
        match self.download(url, dir, &file_name).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(url, error = %e, "image download failed, posting without image");
                None
            }
        }
    }

    async fn download(&self, url: &str, dir: PathBuf, file_name: &str) -> Result<PathBuf> {
        let resp = self.client.get(url).send().await
            .context("image request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("image {} ({})", url, status);
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.starts_with("image/") {
            anyhow::bail!("image {} is not an image (content-type {:?})", url, content_type);
        }
        let bytes = resp.bytes().await.context("failed to read image body")?;

        tokio::fs::create_dir_all(&dir).await
            .with_context(|| format!("Failed to create image dir: {}", dir.display()))?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes).await
            .with_context(|| format!("Failed to write image: {}", path.display()))?;

        tracing::debug!(url, path = %path.display(), bytes = bytes.len(), "image downloaded");
        Ok(path)
    }

    /// Remove everything in the cache directory. A missing directory is already clear.
    pub fn clear(&self) -> Result<()> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read image dir: {}", self.dir.display()))
            }
        };
        for entry in entries {
            let path = entry?.path();
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            removed.with_context(|| format!("Failed to remove cached image: {}", path.display()))?;
        }
        Ok(())
    }
}

/// Cache subdirectory for an entry; ids that could escape the cache are refused.
fn entry_dir_name(entry_id: &str) -> Option<&str> {
    let plain = !entry_id.is_empty()
        && entry_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    plain.then_some(entry_id)
}

/// Last non-empty path segment of the URL, if it is a plain file name.
pub fn file_name_for(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    if name == "." || name == ".." || name.contains('\\') {
        return None;
    }
    Some(name.to_string())
}
