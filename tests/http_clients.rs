// HTTP collaborators exercised against mock servers.

use mockito::Matcher;
use reddit_twitter_bot::config::{Listing, TwitterCredentials};
use reddit_twitter_bot::feed::reddit::RedditFeed;
use reddit_twitter_bot::feed::ContentFeed;
use reddit_twitter_bot::images::ImageCache;
use reddit_twitter_bot::publisher::StatusPublisher;
use reddit_twitter_bot::shortener::{GoogleShortener, LinkShortener};
use reddit_twitter_bot::twitter::auth::OAuth1Signer;
use reddit_twitter_bot::twitter::rest::TwitterRest;
use tempfile::TempDir;

fn twitter(server: &mockito::Server) -> TwitterRest {
    let signer = OAuth1Signer::new(TwitterCredentials {
        consumer_key: "ck".to_string(),
        consumer_secret: "cs".to_string(),
        access_token: "at".to_string(),
        access_token_secret: "ats".to_string(),
    });
    TwitterRest::new(signer, &server.url(), &server.url()).unwrap()
}

#[tokio::test]
async fn test_reddit_feed_reads_hot_listing() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let mock = server
        .mock("GET", "/r/dataisbeautiful/hot.json")
        .match_query(Matcher::UrlEncoded("limit".into(), "2".into()))
        .match_header("user-agent", "reddit Twitter bot monitoring dataisbeautiful")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "kind": "Listing",
                "data": {
                    "children": [
                        {"kind": "t3", "data": {
                            "id": "a1", "title": "Chart one",
                            "permalink": "/r/dataisbeautiful/comments/a1/chart_one/",
                            "url": "https://i.imgur.com/one.png"
                        }},
                        {"kind": "t3", "data": {
                            "id": "b2", "title": "Discussion",
                            "permalink": "/r/dataisbeautiful/comments/b2/discussion/",
                            "url": "URL_PLACEHOLDER/r/dataisbeautiful/comments/b2/discussion/"
                        }},
                        {"kind": "t3", "data": {
                            "id": "c3", "title": "Over the limit",
                            "permalink": "/r/dataisbeautiful/comments/c3/x/"
                        }}
                    ]
                }
            }"#
            .replace("URL_PLACEHOLDER", &base),
        )
        .create_async()
        .await;

    let mut feed = RedditFeed::new(&base, Listing::Hot);
    let entries = feed.fetch_entries("dataisbeautiful", 2).await.unwrap();
    mock.assert_async().await;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "a1");
    assert_eq!(
        entries[0].permalink,
        format!("{}/r/dataisbeautiful/comments/a1/chart_one/", base)
    );
    assert_eq!(entries[0].external_url.as_deref(), Some("https://i.imgur.com/one.png"));
    assert_eq!(entries[1].id, "b2");
    assert_eq!(entries[1].external_url, None);
}

#[tokio::test]
async fn test_reddit_feed_error_status_is_fatal() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/r/private/top.json")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("forbidden")
        .create_async()
        .await;

    let mut feed = RedditFeed::new(&server.url(), Listing::Top);
    let err = feed.fetch_entries("private", 5).await.unwrap_err();
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn test_shortener_posts_long_url_with_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/url")
        .match_query(Matcher::UrlEncoded("key".into(), "secret-key".into()))
        .match_body(Matcher::Json(serde_json::json!({
            "longUrl": "https://www.reddit.com/r/x/comments/a1"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"kind": "urlshortener#url", "id": "https://goo.gl/fbsS", "longUrl": "https://www.reddit.com/r/x/comments/a1"}"#)
        .create_async()
        .await;

    let shortener = GoogleShortener::new("secret-key".to_string(), &server.url());
    let short = shortener.shorten("https://www.reddit.com/r/x/comments/a1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(short, "https://goo.gl/fbsS");
}

#[tokio::test]
async fn test_shortener_error_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/url")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error": {"message": "Invalid key"}}"#)
        .create_async()
        .await;

    let shortener = GoogleShortener::new("bad".to_string(), &server.url());
    assert!(shortener.shorten("https://example.com").await.is_err());
}

#[tokio::test]
async fn test_publish_text_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/1.1/statuses/update.json")
        .match_header("authorization", Matcher::Regex("^OAuth oauth_consumer_key=\"ck\"".into()))
        .match_body(Matcher::UrlEncoded(
            "status".into(),
            "Chart one https://goo.gl/fbsS #dataviz".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id_str": "1050118621198921728", "text": "Chart one"}"#)
        .create_async()
        .await;

    let client = twitter(&server);
    let id = client
        .publish("Chart one https://goo.gl/fbsS #dataviz", None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(id, "1050118621198921728");
}

#[tokio::test]
async fn test_publish_with_image_uploads_then_posts() {
    let tmp = TempDir::new().unwrap();
    let image = tmp.path().join("chart.png");
    std::fs::write(&image, b"\x89PNG fake").unwrap();

    let mut server = mockito::Server::new_async().await;
    let upload = server
        .mock("POST", "/1.1/media/upload.json")
        .match_header("authorization", Matcher::Regex("^OAuth ".into()))
        .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"media_id": 710511363345354753, "media_id_string": "710511363345354753"}"#)
        .create_async()
        .await;
    let status = server
        .mock("POST", "/1.1/statuses/update.json")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("status".into(), "Chart https://goo.gl/a #dataviz".into()),
            Matcher::UrlEncoded("media_ids".into(), "710511363345354753".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id_str": "42"}"#)
        .create_async()
        .await;

    let client = twitter(&server);
    let id = client
        .publish("Chart https://goo.gl/a #dataviz", Some(image.as_path()))
        .await
        .unwrap();

    upload.assert_async().await;
    status.assert_async().await;
    assert_eq!(id, "42");
}

#[tokio::test]
async fn test_publish_failure_status_is_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/1.1/statuses/update.json")
        .with_status(403)
        .with_body(r#"{"errors": [{"code": 187, "message": "Status is a duplicate."}]}"#)
        .create_async()
        .await;

    let client = twitter(&server);
    let err = client.publish("dup", None).await.unwrap_err();
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn test_verify_credentials_rejects_unauthorized() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/1.1/account/verify_credentials.json")
        .with_status(401)
        .with_body(r#"{"errors": [{"code": 32, "message": "Could not authenticate you."}]}"#)
        .create_async()
        .await;

    let client = twitter(&server);
    let err = client.verify_credentials().await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_image_download_overwrites_existing_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("img");
    std::fs::create_dir_all(dir.join("a1")).unwrap();
    std::fs::write(dir.join("a1").join("chart.png"), b"stale").unwrap();

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/a/chart.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body("fresh")
        .create_async()
        .await;

    let cache = ImageCache::new(&dir, &["127.0.0.1".to_string()]);
    let url = format!("{}/a/chart.png", server.url());
    let path = cache.fetch("a1", Some(&url)).await.unwrap();

    assert_eq!(path, dir.join("a1").join("chart.png"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");
}

#[tokio::test]
async fn test_image_html_page_is_not_attached() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("img");
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/gallery/abc")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body("<html><body>imgur gallery</body></html>")
        .create_async()
        .await;

    let cache = ImageCache::new(&dir, &["127.0.0.1".to_string()]);
    let url = format!("{}/gallery/abc", server.url());
    assert_eq!(cache.fetch("a1", Some(&url)).await, None);

    mock.assert_async().await;
    assert!(!dir.join("a1").join("abc").exists());
}

#[tokio::test]
async fn test_image_missing_content_type_is_not_attached() {
    let tmp = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/raw.png")
        .with_status(200)
        .with_body("bytes")
        .create_async()
        .await;

    let cache = ImageCache::new(tmp.path().join("img"), &["127.0.0.1".to_string()]);
    let url = format!("{}/raw.png", server.url());
    assert_eq!(cache.fetch("a1", Some(&url)).await, None);
}

#[tokio::test]
async fn test_images_with_same_file_name_stay_separate() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("img");
    let mut server = mockito::Server::new_async().await;
    let _first = server
        .mock("GET", "/one/chart.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body("first")
        .create_async()
        .await;
    let _second = server
        .mock("GET", "/two/chart.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body("second")
        .create_async()
        .await;

    let cache = ImageCache::new(&dir, &["127.0.0.1".to_string()]);
    let a = cache.fetch("a1", Some(&format!("{}/one/chart.png", server.url()))).await.unwrap();
    let b = cache.fetch("b2", Some(&format!("{}/two/chart.png", server.url()))).await.unwrap();

    assert_ne!(a, b);
    assert_eq!(std::fs::read_to_string(&a).unwrap(), "first");
    assert_eq!(std::fs::read_to_string(&b).unwrap(), "second");
}

#[tokio::test]
async fn test_image_download_failure_degrades_to_none() {
    let tmp = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/missing.png")
        .with_status(500)
        .create_async()
        .await;

    let cache = ImageCache::new(tmp.path().join("img"), &["127.0.0.1".to_string()]);
    let url = format!("{}/missing.png", server.url());
    assert_eq!(cache.fetch("a1", Some(&url)).await, None);
}
