use base64::Engine;
use mockito::{Matcher, Server};
use serde_json::json;

use repo_blog_core::contract::{ContentSource, EntryKind};
use repo_blog_core::error::ScanError;
use repo_blog_core::github::GitHubClient;

fn repo_json(topics: Option<Vec<&str>>) -> serde_json::Value {
    let mut repo = json!({
        "name": "foo",
        "full_name": "me/foo",
        "description": "Does things",
        "html_url": "https://github.com/me/foo",
        "homepage": null,
        "language": "Rust",
        "stargazers_count": 12,
        "forks_count": 3,
        "open_issues_count": 1,
        "license": { "name": "MIT License" },
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-06-01T12:30:00Z"
    });
    if let Some(topics) = topics {
        repo["topics"] = json!(topics);
    }
    repo
}

#[tokio::test]
async fn test_rate_limit_and_token_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rate_limit")
        .match_header("authorization", "Bearer secret")
        .match_header("user-agent", "repo-blog")
        .with_status(200)
        .with_body(json!({ "resources": { "core": { "remaining": 4321 } } }).to_string())
        .create_async()
        .await;

    let client = GitHubClient::new(&server.url(), Some("secret")).unwrap();
    assert_eq!(client.rate_limit_remaining().await.unwrap(), 4321);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_repository_metadata_with_inline_topics() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/me/foo")
        .with_status(200)
        .with_body(repo_json(Some(vec!["cli", "tool"])).to_string())
        .create_async()
        .await;
    let topics = server
        .mock("GET", "/repos/me/foo/topics")
        .expect(0)
        .create_async()
        .await;

    let client = GitHubClient::new(&server.url(), None).unwrap();
    let meta = client.repository("me/foo").await.unwrap();

    assert_eq!(meta.full_name, "me/foo");
    assert_eq!(meta.description, "Does things");
    assert_eq!(meta.homepage, "");
    assert_eq!(meta.language, "Rust");
    assert_eq!((meta.stars, meta.forks, meta.open_issues), (12, 3, 1));
    assert_eq!(meta.topics, vec!["cli", "tool"]);
    assert_eq!(meta.license, "MIT License");
    assert!(meta.created_at.is_some());
    topics.assert_async().await;
}

#[tokio::test]
async fn test_repository_topics_fetched_separately_when_absent() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/me/foo")
        .with_status(200)
        .with_body(repo_json(None).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/repos/me/foo/topics")
        .with_status(200)
        .with_body(json!({ "names": ["docs"] }).to_string())
        .create_async()
        .await;

    let client = GitHubClient::new(&server.url(), None).unwrap();
    let meta = client.repository("me/foo").await.unwrap();
    assert_eq!(meta.topics, vec!["docs"]);
}

#[tokio::test]
async fn test_list_directory_maps_entry_kinds() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/me/foo/contents/docs")
        .with_status(200)
        .with_body(
            json!([
                { "name": "guide.md", "path": "docs/guide.md", "type": "file", "size": 42,
                  "html_url": "https://github.com/me/foo/blob/main/docs/guide.md" },
                { "name": "deep", "path": "docs/deep", "type": "dir", "size": 0, "html_url": null },
                { "name": "link", "path": "docs/link", "type": "symlink", "size": 7 }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let client = GitHubClient::new(&server.url(), None).unwrap();
    let entries = client.list_directory("me/foo", "docs").await.unwrap();

    let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EntryKind::File, EntryKind::Dir, EntryKind::Other]);
    assert_eq!(entries[0].size, 42);
    assert_eq!(entries[1].html_url, "");
}

#[tokio::test]
async fn test_read_file_decodes_wrapped_base64() {
    let encoded = base64::engine::general_purpose::STANDARD.encode("# Foo\n\nHello, world.\n");
    let (head, tail) = encoded.split_at(8);
    let wrapped = format!("{head}\n{tail}\n");

    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/me/foo/contents/docs/README.md")
        .with_status(200)
        .with_body(json!({ "content": wrapped, "encoding": "base64" }).to_string())
        .create_async()
        .await;

    let client = GitHubClient::new(&server.url(), None).unwrap();
    let text = client.read_file("me/foo", "docs/README.md").await.unwrap();
    assert_eq!(text, "# Foo\n\nHello, world.\n");
}

#[tokio::test]
async fn test_read_file_falls_back_to_download_url() {
    let mut server = Server::new_async().await;
    let raw_url = format!("{}/raw/me/foo/big.md", server.url());
    server
        .mock("GET", "/repos/me/foo/contents/big.md")
        .with_status(200)
        .with_body(json!({ "content": "", "encoding": "none", "download_url": raw_url }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/raw/me/foo/big.md")
        .with_status(200)
        .with_body("raw body")
        .create_async()
        .await;

    let client = GitHubClient::new(&server.url(), None).unwrap();
    assert_eq!(client.read_file("me/foo", "big.md").await.unwrap(), "raw body");
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/me/missing")
        .with_status(404)
        .with_body("{\"message\":\"Not Found\"}")
        .create_async()
        .await;
    server
        .mock("GET", "/repos/me/limited")
        .with_status(403)
        .with_header("x-ratelimit-remaining", "0")
        .with_body("{\"message\":\"API rate limit exceeded\"}")
        .create_async()
        .await;
    server
        .mock("GET", "/repos/me/private")
        .with_status(403)
        .with_header("x-ratelimit-remaining", "4999")
        .with_body("{\"message\":\"Forbidden\"}")
        .create_async()
        .await;
    server
        .mock("GET", "/repos/me/flaky")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let client = GitHubClient::new(&server.url(), None).unwrap();
    assert!(matches!(
        client.repository("me/missing").await,
        Err(ScanError::NotFound(_))
    ));
    assert!(matches!(
        client.repository("me/limited").await,
        Err(ScanError::RateLimited(ref body)) if body.contains("rate limit")
    ));
    assert!(matches!(
        client.repository("me/private").await,
        Err(ScanError::Unauthorized(_))
    ));
    assert!(matches!(
        client.repository("me/flaky").await,
        Err(ScanError::Http { status: 502, .. })
    ));
}

#[tokio::test]
async fn test_listing_root_uses_contents_endpoint() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Regex("^/repos/me/foo/contents/?$".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = GitHubClient::new(&server.url(), None).unwrap();
    assert!(client.list_directory("me/foo", "").await.unwrap().is_empty());
    mock.assert_async().await;
}
