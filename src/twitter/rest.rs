use super::auth::OAuth1Signer;
use super::types::*;
use crate::publisher::StatusPublisher;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;

pub struct TwitterRest {
    client: Client,
    signer: OAuth1Signer,
    api_base: String,
    upload_base: String,
}

impl TwitterRest {
    pub fn new(signer: OAuth1Signer, api_base: &str, upload_base: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(2)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            signer,
            api_base: api_base.trim_end_matches('/').to_string(),
            upload_base: upload_base.trim_end_matches('/').to_string(),
        })
    }

    /// Post a status, optionally referencing previously uploaded media.
    pub async fn update_status(&self, text: &str, media_id: Option<&str>) -> Result<Status> {
        let url = format!("{}/1.1/statuses/update.json", self.api_base);
        let mut params: Vec<(&str, &str)> = vec![("status", text)];
        if let Some(id) = media_id {
            params.push(("media_ids", id));
        }

        let auth = self.signer.authorization("POST", &url, &params);
        let resp = self.client.post(&url)
            .header(AUTHORIZATION, auth)
            .form(&params)
            .send().await
            .context("status update request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("status update failed ({}): {}", status, body);
        }
        resp.json().await.context("failed to parse status response")
    }

    /// Upload an image file and return its media id.
    pub async fn upload_media(&self, path: &Path) -> Result<String> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base);
        let bytes = tokio::fs::read(path).await
            .with_context(|| format!("Failed to read image: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let form = Form::new().part("media", Part::bytes(bytes).file_name(file_name));

        let auth = self.signer.authorization("POST", &url, &[]);
        let resp = self.client.post(&url)
            .header(AUTHORIZATION, auth)
            .multipart(form)
            .send().await
            .context("media upload request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("media upload failed ({}): {}", status, body);
        }
        let upload: MediaUpload = resp.json().await
            .context("failed to parse media upload response")?;
        Ok(upload.media_id_string)
    }

    /// Pre-flight check: confirm the credential quadruple is accepted before
    /// any entry is processed.
    pub async fn verify_credentials(&self) -> Result<Account> {
        let url = format!("{}/1.1/account/verify_credentials.json", self.api_base);
        let auth = self.signer.authorization("GET", &url, &[]);
        let resp = self.client.get(&url)
            .header(AUTHORIZATION, auth)
            .send().await
            .context("credential check request failed")?;

        let status = resp.status();
        if status.as_u16() == 401 {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Authentication failed (401 Unauthorized).\n\
                 Possible causes:\n\
                 - consumer key/secret and access token/secret belong to different apps\n\
                 - tokens have been revoked or regenerated\n\
                 - system clock is significantly out of sync\n\
                 Server response: {}",
                body
            );
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("credential check failed ({}): {}", status, body);
        }
        resp.json().await.context("failed to parse account response")
    }
}

#[async_trait]
impl StatusPublisher for TwitterRest {
    async fn publish(&self, text: &str, image: Option<&Path>) -> Result<String> {
        let media_id = match image {
            Some(path) => Some(self.upload_media(path).await?),
            None => None,
        };
        let posted = self.update_status(text, media_id.as_deref()).await?;
        Ok(posted.id_str)
    }
}
