use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait LinkShortener: Send + Sync {
    async fn shorten(&self, long_url: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShortenRequest<'a> {
    long_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    id: Option<String>,
}

/// Client for the Google-style URL shortener (`POST /v1/url?key=...`).
pub struct GoogleShortener {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleShortener {
    pub fn new(api_key: String, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LinkShortener for GoogleShortener {
    async fn shorten(&self, long_url: &str) -> Result<String> {
        let url = format!("{}/v1/url", self.base_url);

        let resp = self.client.post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&ShortenRequest { long_url })
            .send().await
            .context("shortener request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("shortener ({}): {}", status, body);
        }

        let parsed: ShortenResponse = resp.json().await
            .context("failed to parse shortener response")?;
        match parsed.id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => anyhow::bail!("shortener returned no short link for {}", long_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_uses_camel_case() {
        let body = serde_json::to_string(&ShortenRequest { long_url: "https://example.com" }).unwrap();
        assert_eq!(body, r#"{"longUrl":"https://example.com"}"#);
    }
}
