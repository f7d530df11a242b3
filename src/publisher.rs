use crate::ledger::PublishLedger;
use crate::selector::{PreparedPost, SelectedPost};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

#[async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Publish `text`, attaching `image` when given. Returns the new status id.
    async fn publish(&self, text: &str, image: Option<&Path>) -> Result<String>;
}

/// `<title> <link> <hashtag>`
pub fn compose_status(post: &PreparedPost, hashtag: &str) -> String {
    let hashtag = hashtag.trim();
    if hashtag.is_empty() {
        format!("{} {}", post.title, post.link)
    } else {
        format!("{} {} {}", post.title, post.link, hashtag)
    }
}

/// What happened to each selected entry in one batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub published: Vec<String>,
    pub failed: Vec<String>,
    pub dry_run: Vec<String>,
}

pub struct Publisher<'a> {
    client: &'a dyn StatusPublisher,
    hashtag: String,
    delay: Duration,
    dry_run: bool,
}

impl<'a> Publisher<'a> {
    pub fn new(client: &'a dyn StatusPublisher, hashtag: &str, delay: Duration, dry_run: bool) -> Self {
        Self {
            client,
            hashtag: hashtag.to_string(),
            delay,
            dry_run,
        }
    }

    /// Publish each post in order, recording every success before moving on.
    ///
    /// A failed publish is logged and skipped; its id stays out of the ledger.
    /// A failed ledger append aborts the batch.
    pub async fn publish_all(
        &self,
        posts: Vec<SelectedPost>,
        ledger: &mut dyn PublishLedger,
    ) -> Result<PublishOutcome> {
        let mut outcome = PublishOutcome::default();
        let total = posts.len();

        for (i, selected) in posts.into_iter().enumerate() {
            let text = compose_status(&selected.post, &self.hashtag);

            if self.dry_run {
                tracing::info!(id = %selected.id, text = %text, "DRY RUN: would publish");
                outcome.dry_run.push(selected.id);
                continue;
            }

            tracing::info!(id = %selected.id, text = %text, "publishing");
            match self.submit(&text, selected.post.image.as_deref()).await {
                Ok(status_id) => {
                    ledger.record(&selected.id)
                        .with_context(|| format!("published {} but could not record it", selected.id))?;
                    tracing::info!(id = %selected.id, status_id = %status_id, "published");
                    outcome.published.push(selected.id);
                }
                Err(e) => {
                    tracing::warn!(id = %selected.id, error = %e, "publish failed, will retry next run");
                    outcome.failed.push(selected.id);
                }
            }

            if i + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(outcome)
    }

    async fn submit(&self, text: &str, image: Option<&Path>) -> Result<String> {
        if let Some(path) = image {
            if !path.exists() {
                anyhow::bail!("attached image missing: {}", path.display());
            }
        }
        self.client.publish(text, image).await
    }
}
