pub mod reddit;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use types::FeedEntry;

#[async_trait]
pub trait ContentFeed: Send + Sync {
    /// Fetch up to `limit` entries for `source`, in the feed's ranking order.
    async fn fetch_entries(&mut self, source: &str, limit: u32) -> Result<Vec<FeedEntry>>;
}
