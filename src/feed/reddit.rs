use super::types::*;
use super::ContentFeed;
use crate::config::Listing;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;

/// Reads a subreddit listing through the public JSON endpoints.
pub struct RedditFeed {
    client: Client,
    base_url: String,
    listing: Listing,
}

impl RedditFeed {
    pub fn new(base_url: &str, listing: Listing) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            listing,
        }
    }

    fn user_agent(source: &str) -> String {
        format!("reddit Twitter bot monitoring {}", source)
    }

    /// Normalize a raw listing post into a `FeedEntry`.
    fn to_entry(&self, post: RedditPost) -> FeedEntry {
        let permalink = if post.permalink.starts_with("http") {
            post.permalink
        } else {
            format!("{}{}", self.base_url, post.permalink)
        };
        // Self posts point back at themselves; treat that as no external URL.
        let external_url = post
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty() && u.trim_end_matches('/') != permalink.trim_end_matches('/'));
        FeedEntry {
            id: post.id,
            title: post.title,
            permalink,
            external_url,
        }
    }
}

#[async_trait]
impl ContentFeed for RedditFeed {
    async fn fetch_entries(&mut self, source: &str, limit: u32) -> Result<Vec<FeedEntry>> {
        let url = format!(
            "{}/r/{}/{}.json?limit={}&raw_json=1",
            self.base_url,
            source,
            self.listing.as_str(),
            limit,
        );

        tracing::info!(source, listing = self.listing.as_str(), "getting posts from reddit");
        let resp = self.client.get(&url)
            .header(USER_AGENT, Self::user_agent(source))
            .send().await
            .context("reddit listing request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("reddit r/{} ({}): {}", source, status, body);
        }

        let listing: RedditListing = resp.json().await
            .context("failed to parse reddit listing")?;

        // The API may return stickied extras beyond the requested limit.
        Ok(listing
            .data
            .children
            .into_iter()
            .take(limit as usize)
            .map(|child| self.to_entry(child.data))
            .collect())
    }
}
