use crate::config::Config;
use crate::feed::ContentFeed;
use crate::images::ImageCache;
use crate::ledger::PublishLedger;
use crate::publisher::{PublishOutcome, Publisher, StatusPublisher};
use crate::selector::{PostSelector, TitleBudget};
use crate::shortener::LinkShortener;
use anyhow::{Context, Result};
use std::time::{Duration, Instant};

/// Counts reported at the end of one invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub selected: usize,
    pub outcome: PublishOutcome,
}

/// Collaborators for one pass: feed -> selector -> publisher -> ledger.
pub struct Pipeline<'a> {
    pub feed: &'a mut dyn ContentFeed,
    pub shortener: &'a dyn LinkShortener,
    pub publisher: &'a dyn StatusPublisher,
    pub ledger: &'a mut dyn PublishLedger,
    pub images: &'a ImageCache,
}

impl Pipeline<'_> {
    /// Run the whole routine once. The image cache is cleared on the way out,
    /// whether or not the pass succeeded.
    pub async fn run_once(&mut self, config: &Config) -> Result<RunSummary> {
        let started = Instant::now();
        let result = self.select_and_publish(config).await;
        let cleared = self.images.clear();

        let summary = result?;
        cleared.context("failed to clear image cache")?;

        tracing::info!(
            fetched = summary.fetched,
            selected = summary.selected,
            published = summary.outcome.published.len(),
            failed = summary.outcome.failed.len(),
            dry_run = summary.outcome.dry_run.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run complete"
        );
        Ok(summary)
    }

    async fn select_and_publish(&mut self, config: &Config) -> Result<RunSummary> {
        let source = config.feed.source.trim();
        let entries = self.feed.fetch_entries(source, config.feed.limit).await
            .with_context(|| format!("failed to read feed r/{}", source))?;
        let fetched = entries.len();

        let selector = PostSelector::new(
            self.shortener,
            self.images,
            TitleBudget::from_config(&config.bot),
            config.feed.link_target,
        );
        let selected = selector.select(entries, &*self.ledger).await;
        let selected_count = selected.len();
        tracing::info!(fetched, selected = selected_count, "selection done");

        let publisher = Publisher::new(
            self.publisher,
            &config.bot.hashtag,
            Duration::from_secs(config.bot.publish_delay_s),
            config.bot.dry_run,
        );
        let outcome = publisher.publish_all(selected, &mut *self.ledger).await?;

        Ok(RunSummary {
            fetched,
            selected: selected_count,
            outcome,
        })
    }
}
