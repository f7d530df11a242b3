use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_FILE: &str = ".env";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub feed: FeedConfig,
    #[serde(default)]
    pub shortener: ShortenerConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Subreddit to monitor, without the `r/` prefix.
    pub source: String,
    #[serde(default)]
    pub listing: Listing,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_feed_base")]
    pub base_url: String,
    #[serde(default)]
    pub link_target: LinkTarget,
}

/// Which ranking the feed is read from.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Listing {
    /// Most engaged-with, weighted by age.
    #[default]
    Hot,
    /// Most upvoted, ignoring age.
    Top,
    /// Newest first.
    New,
}

impl Listing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Listing::Hot => "hot",
            Listing::Top => "top",
            Listing::New => "new",
        }
    }
}

/// Which URL of an entry gets shortened into the status.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkTarget {
    #[default]
    Permalink,
    External,
}

fn default_limit() -> u32 { 5 }
fn default_feed_base() -> String { "https://www.reddit.com".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct ShortenerConfig {
    #[serde(default = "default_shortener_base")]
    pub base_url: String,
}

fn default_shortener_base() -> String {
    "https://www.googleapis.com/urlshortener".to_string()
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self { base_url: default_shortener_base() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TwitterConfig {
    #[serde(default = "default_twitter_api")]
    pub api_base: String,
    #[serde(default = "default_twitter_upload")]
    pub upload_base: String,
}

fn default_twitter_api() -> String { "https://api.twitter.com".to_string() }
fn default_twitter_upload() -> String { "https://upload.twitter.com".to_string() }

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_base: default_twitter_api(),
            upload_base: default_twitter_upload(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default = "default_hashtag")]
    pub hashtag: String,
    #[serde(default = "default_budget_with_image")]
    pub title_budget_with_image: usize,
    #[serde(default = "default_budget_without_image")]
    pub title_budget_without_image: usize,
    #[serde(default = "default_publish_delay")]
    pub publish_delay_s: u64,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default = "default_image_hosts")]
    pub image_hosts: Vec<String>,
    /// Log what would be posted without publishing or touching the ledger.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_hashtag() -> String { "#dataviz".to_string() }
fn default_budget_with_image() -> usize { 83 }
fn default_budget_without_image() -> usize { 106 }
fn default_publish_delay() -> u64 { 30 }
fn default_ledger_path() -> PathBuf { PathBuf::from("posted_posts.txt") }
fn default_image_dir() -> PathBuf { PathBuf::from("img") }

fn default_image_hosts() -> Vec<String> {
    vec![
        "i.imgur.com".to_string(),
        "imgur.com".to_string(),
        "i.redd.it".to_string(),
    ]
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            hashtag: default_hashtag(),
            title_budget_with_image: default_budget_with_image(),
            title_budget_without_image: default_budget_without_image(),
            publish_delay_s: default_publish_delay(),
            ledger_path: default_ledger_path(),
            image_dir: default_image_dir(),
            image_hosts: default_image_hosts(),
            dry_run: false,
        }
    }
}

/// OAuth 1.0a user-context credentials for the publish service.
#[derive(Clone)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"***")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"***")
            .finish()
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the run meaningless before any network call.
    pub fn validate(&self) -> Result<()> {
        let source = self.feed.source.trim();
        if source.is_empty() {
            anyhow::bail!("feed.source must name the subreddit to monitor");
        }
        if source.contains('/') || source.contains(char::is_whitespace) {
            anyhow::bail!("feed.source must be a bare subreddit name, got {:?}", source);
        }
        if self.feed.limit == 0 {
            anyhow::bail!("feed.limit must be > 0");
        }
        if self.bot.title_budget_with_image < 2 || self.bot.title_budget_without_image < 2 {
            anyhow::bail!(
                "title budgets must be >= 2, got {} (with image) / {} (without)",
                self.bot.title_budget_with_image,
                self.bot.title_budget_without_image
            );
        }
        Ok(())
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for (key, value) in parse_env_lines(content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    pub fn twitter_credentials() -> Result<TwitterCredentials> {
        Ok(TwitterCredentials {
            consumer_key: required_env("TWITTER_CONSUMER_KEY")?,
            consumer_secret: required_env("TWITTER_CONSUMER_SECRET")?,
            access_token: required_env("TWITTER_ACCESS_TOKEN")?,
            access_token_secret: required_env("TWITTER_ACCESS_TOKEN_SECRET")?,
        })
    }

    pub fn shortener_api_key() -> Result<String> {
        required_env("SHORTENER_API_KEY")
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !sanitize_key(&value).is_empty() => Ok(sanitize_key(&value)),
        _ => anyhow::bail!("{} is not set (environment or {})", name, ENV_FILE),
    }
}

/// Parse KEY=VALUE lines, skipping blanks and comments.
fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
