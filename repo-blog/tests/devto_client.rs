use mockito::{Matcher, Server};
use serde_json::json;

use repo_blog::devto::DevToClient;
use repo_blog_core::contract::{ArticleClient, ArticleDraft, ArticleUpdate};
use repo_blog_core::error::PublishError;

fn article_json(id: u64, published: bool) -> String {
    json!({
        "id": id,
        "url": format!("https://dev.to/me/post-{id}"),
        "published": published,
        "title": "Foo Does Things"
    })
    .to_string()
}

#[tokio::test]
async fn test_create_sends_wrapped_article_with_api_key() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/articles")
        .match_header("api-key", "secret")
        .match_body(Matcher::PartialJson(json!({
            "article": {
                "title": "Foo Does Things",
                "published": false,
                "body_markdown": "Body",
                "tags": ["rust", "cli"],
                "canonical_url": "https://github.com/me/foo"
            }
        })))
        .with_status(201)
        .with_body(article_json(7, false))
        .create_async()
        .await;

    let client = DevToClient::new(&server.url(), "secret").unwrap();
    let article = client
        .create_article(ArticleDraft {
            title: "Foo Does Things".into(),
            body_markdown: "Body".into(),
            tags: vec!["rust".into(), "cli".into()],
            canonical_url: Some("https://github.com/me/foo".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(article.id, 7);
    assert_eq!(article.url, "https://dev.to/me/post-7");
    assert!(!article.published);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_validation_failure_keeps_status_and_body() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/articles")
        .with_status(422)
        .with_body("{\"error\":\"Tag list exceeds the maximum of 4 tags\",\"status\":422}")
        .create_async()
        .await;

    let client = DevToClient::new(&server.url(), "secret").unwrap();
    let err = client
        .create_article(ArticleDraft::default())
        .await
        .unwrap_err();

    assert!(!err.is_retryable());
    let (status, body) = err.response().unwrap();
    assert_eq!(status, 422);
    assert!(body.contains("maximum of 4 tags"));
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/articles/9")
        .with_status(503)
        .create_async()
        .await;

    let client = DevToClient::new(&server.url(), "secret").unwrap();
    let err = client.get_article(9).await.unwrap_err();
    assert!(matches!(err, PublishError::Http { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_update_sends_only_changed_fields() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/articles/7")
        .match_body(Matcher::Json(json!({ "article": { "published": true } })))
        .with_status(200)
        .with_body(article_json(7, true))
        .create_async()
        .await;

    let client = DevToClient::new(&server.url(), "secret").unwrap();
    let article = client
        .update_article(
            7,
            ArticleUpdate {
                published: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(article.published);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_my_articles_pages() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/articles/me")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("per_page".into(), "5".into()),
        ]))
        .with_status(200)
        .with_body(format!("[{}, {}]", article_json(1, true), article_json(2, false)))
        .create_async()
        .await;

    let client = DevToClient::new(&format!("{}/", server.url()), "secret").unwrap();
    let articles = client.list_my_articles(2, 5).await.unwrap();
    let ids: Vec<u64> = articles.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 2]);
    mock.assert_async().await;
}
