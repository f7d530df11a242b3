use serde::Deserialize;

/// One item read from the feed. Provider-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    /// Absolute URL of the entry itself.
    pub permalink: String,
    /// URL the entry points to, if it is not a self post.
    pub external_url: Option<String>,
}

/// Reddit listing response: `{ "data": { "children": [ { "data": {...} } ] } }`
#[derive(Debug, Deserialize)]
pub struct RedditListing {
    pub data: RedditListingData,
}

#[derive(Debug, Deserialize)]
pub struct RedditListingData {
    #[serde(default)]
    pub children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
pub struct RedditChild {
    pub data: RedditPost,
}

#[derive(Debug, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub permalink: String,
    #[serde(default)]
    pub url: Option<String>,
}
