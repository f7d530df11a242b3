use crate::config::{BotConfig, LinkTarget};
use crate::feed::types::FeedEntry;
use crate::images::ImageCache;
use crate::ledger::PublishLedger;
use crate::shortener::LinkShortener;
use std::path::PathBuf;

pub const ELLIPSIS: char = '…';

/// Status content derived from one feed entry, consumed once by the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPost {
    pub title: String,
    pub link: String,
    pub image: Option<PathBuf>,
}

/// A prepared post paired with the feed id it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPost {
    pub id: String,
    pub post: PreparedPost,
}

/// Title length limits; an attached image leaves less room for text.
#[derive(Debug, Clone, Copy)]
pub struct TitleBudget {
    pub with_image: usize,
    pub without_image: usize,
}

impl TitleBudget {
    pub fn from_config(bot: &BotConfig) -> Self {
        Self {
            with_image: bot.title_budget_with_image,
            without_image: bot.title_budget_without_image,
        }
    }

    pub fn for_image(&self, has_image: bool) -> usize {
        if has_image { self.with_image } else { self.without_image }
    }
}

/// Cut `title` to at most `budget` characters, ending in an ellipsis when cut.
pub fn truncate_title(title: &str, budget: usize) -> String {
    if title.chars().count() <= budget {
        return title.to_string();
    }
    let mut out: String = title.chars().take(budget.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

/// Drop entries already in the ledger, keeping feed order.
pub fn filter_unpublished(entries: Vec<FeedEntry>, ledger: &dyn PublishLedger) -> Vec<FeedEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            let seen = ledger.has(&entry.id);
            if seen {
                tracing::info!(id = %entry.id, "already published, skipping");
            }
            !seen
        })
        .collect()
}

pub struct PostSelector<'a> {
    shortener: &'a dyn LinkShortener,
    images: &'a ImageCache,
    budget: TitleBudget,
    link_target: LinkTarget,
}

impl<'a> PostSelector<'a> {
    pub fn new(
        shortener: &'a dyn LinkShortener,
        images: &'a ImageCache,
        budget: TitleBudget,
        link_target: LinkTarget,
    ) -> Self {
        Self { shortener, images, budget, link_target }
    }

    /// Filter out published entries and prepare the rest, in feed order.
    ///
    /// An entry whose link cannot be shortened is left out of this run; it
    /// stays out of the ledger and is picked up again next time.
    pub async fn select(
        &self,
        entries: Vec<FeedEntry>,
        ledger: &dyn PublishLedger,
    ) -> Vec<SelectedPost> {
        let fresh = filter_unpublished(entries, ledger);
        let mut selected = Vec::with_capacity(fresh.len());

        for entry in fresh {
            let image = self.images.fetch(&entry.id, entry.external_url.as_deref()).await;
            let title = truncate_title(&entry.title, self.budget.for_image(image.is_some()));

            let long_url = match self.link_target {
                LinkTarget::Permalink => entry.permalink.as_str(),
                LinkTarget::External => entry.external_url.as_deref().unwrap_or(&entry.permalink),
            };
            tracing::debug!(id = %entry.id, url = long_url, "shortening link");
            let link = match self.shortener.shorten(long_url).await {
                Ok(short) => short,
                Err(e) => {
                    tracing::warn!(id = %entry.id, error = %e, "link shortening failed, skipping entry");
                    continue;
                }
            };

            selected.push(SelectedPost {
                id: entry.id,
                post: PreparedPost { title, link, image },
            });
        }

        selected
    }
}
