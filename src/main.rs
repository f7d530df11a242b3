use anyhow::Result;
use reddit_twitter_bot::config::{self, Config};
use reddit_twitter_bot::feed::reddit::RedditFeed;
use reddit_twitter_bot::images::ImageCache;
use reddit_twitter_bot::ledger::{self, IndexedLedger};
use reddit_twitter_bot::pipeline::Pipeline;
use reddit_twitter_bot::shortener::GoogleShortener;
use reddit_twitter_bot::twitter::{auth::OAuth1Signer, rest::TwitterRest};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reddit_twitter_bot=info")),
        )
        .init();

    let config_path = std::env::var("BOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let config = Config::load(&config_path)?;

    // Load saved keys from .env (real env vars take precedence)
    Config::load_env_file();
    let twitter_creds = Config::twitter_credentials()?;
    let shortener_key = Config::shortener_api_key()?;

    ledger::ensure_exists(&config.bot.ledger_path)?;

    tracing::info!(source = %config.feed.source, "setting up connection with reddit");
    let mut feed = RedditFeed::new(&config.feed.base_url, config.feed.listing);
    let shortener = GoogleShortener::new(shortener_key, &config.shortener.base_url);
    let twitter = TwitterRest::new(
        OAuth1Signer::new(twitter_creds),
        &config.twitter.api_base,
        &config.twitter.upload_base,
    )?;
    let images = ImageCache::new(&config.bot.image_dir, &config.bot.image_hosts);
    let mut ledger = IndexedLedger::open(&config.bot.ledger_path);

    if config.bot.dry_run {
        tracing::warn!("dry run: nothing will be published or recorded");
    } else {
        let account = twitter.verify_credentials().await?;
        tracing::info!(screen_name = %account.screen_name, "twitter credentials accepted");
    }

    let mut pipeline = Pipeline {
        feed: &mut feed,
        shortener: &shortener,
        publisher: &twitter,
        ledger: &mut ledger,
        images: &images,
    };
    pipeline.run_once(&config).await?;

    tracing::debug!("shutting down");
    Ok(())
}
