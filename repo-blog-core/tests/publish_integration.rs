use std::fs::write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::tempdir;

use repo_blog_core::contract::{
    ArticleDraft, ArticleUpdate, MockArticleClient, PublishedArticle, Sleeper,
};
use repo_blog_core::error::PublishError;
use repo_blog_core::publish::{draft_from_text, load_draft, Publisher, UNTITLED};

#[derive(Clone, Default)]
struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn article(draft: &ArticleDraft) -> PublishedArticle {
    PublishedArticle {
        id: 42,
        url: "https://dev.to/me/post-42".into(),
        published: draft.published,
        title: draft.title.clone(),
    }
}

fn draft_with_tags(n: usize) -> ArticleDraft {
    ArticleDraft {
        title: "Post".into(),
        body_markdown: "Body".into(),
        tags: (1..=n).map(|i| format!("t{i}")).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_publish_caps_tags_before_sending() {
    let mut client = MockArticleClient::new();
    client
        .expect_create_article()
        .withf(|draft| draft.tags == vec!["t1", "t2", "t3", "t4"])
        .times(1)
        .returning(|draft| Ok(article(&draft)));

    let publisher = Publisher::new(client).with_sleeper(RecordingSleeper::default());
    let result = publisher.publish(draft_with_tags(7)).await.unwrap();
    assert_eq!(result.id, 42);
    assert_eq!(result.title, "Post");
}

#[tokio::test]
async fn test_publish_retries_server_errors() {
    let mut seq = mockall::Sequence::new();
    let mut client = MockArticleClient::new();
    client
        .expect_create_article()
        .times(2)
        .in_sequence(&mut seq)
        .returning(|_| {
            Err(PublishError::Http {
                status: 503,
                body: "try later".into(),
            })
        });
    client
        .expect_create_article()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|draft| Ok(article(&draft)));

    let sleeper = RecordingSleeper::default();
    let publisher = Publisher::new(client).with_sleeper(sleeper.clone());
    publisher.publish(draft_with_tags(1)).await.unwrap();

    let delays = sleeper.delays.lock().unwrap().clone();
    assert_eq!(delays, vec![Duration::from_secs(2), Duration::from_secs(4)]);
}

#[tokio::test]
async fn test_client_error_surfaces_immediately_with_body() {
    let mut client = MockArticleClient::new();
    client.expect_create_article().times(1).returning(|_| {
        Err(PublishError::Http {
            status: 422,
            body: "{\"error\":\"Tag list exceeds the maximum of 4 tags\"}".into(),
        })
    });

    let sleeper = RecordingSleeper::default();
    let publisher = Publisher::new(client).with_sleeper(sleeper.clone());
    let err = publisher.publish(draft_with_tags(1)).await.unwrap_err();

    let (status, body) = err.response().expect("http failure");
    assert_eq!(status, 422);
    assert!(body.contains("maximum of 4 tags"));
    assert!(sleeper.delays.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_exhausted_retries_keep_last_response() {
    let mut client = MockArticleClient::new();
    client.expect_create_article().times(3).returning(|_| {
        Err(PublishError::Http {
            status: 429,
            body: "slow down".into(),
        })
    });

    let publisher = Publisher::new(client).with_sleeper(RecordingSleeper::default());
    let err = publisher.publish(draft_with_tags(1)).await.unwrap_err();
    assert!(matches!(err, PublishError::Exhausted { attempts: 3, .. }));
    assert_eq!(err.response(), Some((429, "slow down")));
}

#[tokio::test]
async fn test_update_caps_tags_and_passes_id() {
    let mut client = MockArticleClient::new();
    client
        .expect_update_article()
        .withf(|id, update| *id == 7 && update.tags.as_ref().map(Vec::len) == Some(4))
        .times(1)
        .returning(|id, update| {
            Ok(PublishedArticle {
                id,
                url: String::new(),
                published: update.published.unwrap_or(false),
                title: update.title.unwrap_or_default(),
            })
        });

    let publisher = Publisher::new(client).with_sleeper(RecordingSleeper::default());
    let updated = publisher
        .update(
            7,
            ArticleUpdate {
                title: Some("New".into()),
                tags: Some((0..9).map(|i| i.to_string()).collect()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, 7);
    assert_eq!(updated.title, "New");
}

#[tokio::test]
async fn test_rate_limit_courtesy_delay_goes_through_sleeper() {
    let sleeper = RecordingSleeper::default();
    let publisher = Publisher::new(MockArticleClient::new()).with_sleeper(sleeper.clone());
    publisher.respect_rate_limit(Duration::from_secs(3)).await;
    assert_eq!(*sleeper.delays.lock().unwrap(), vec![Duration::from_secs(3)]);
}

#[test]
fn test_draft_from_text_reads_metadata_block() {
    let text = "---\ntitle: Saved Post\npublished: false\ndescription: About it\ntags:\n- rust\n- cli\ncanonical_url: https://github.com/me/foo\nseries: Tools\n---\n\nBody here";
    let draft = draft_from_text(text, false).unwrap();
    assert_eq!(draft.title, "Saved Post");
    assert!(!draft.published);
    assert_eq!(draft.tags, vec!["rust", "cli"]);
    assert_eq!(draft.description.as_deref(), Some("About it"));
    assert_eq!(draft.series.as_deref(), Some("Tools"));
    assert_eq!(draft.canonical_url.as_deref(), Some("https://github.com/me/foo"));
    assert_eq!(draft.body_markdown, "Body here");
}

#[test]
fn test_publish_now_overrides_block() {
    let draft_block = "---\ntitle: T\npublished: false\n---\n\nB";
    assert!(draft_from_text(draft_block, true).unwrap().published);

    let published_block = "---\ntitle: T\npublished: true\n---\n\nB";
    assert!(draft_from_text(published_block, false).unwrap().published);
}

#[test]
fn test_document_without_block_is_untitled_draft() {
    let draft = draft_from_text("# Heading\n\nJust text", false).unwrap();
    assert_eq!(draft.title, UNTITLED);
    assert!(!draft.published);
    assert!(draft.tags.is_empty());
    assert_eq!(draft.body_markdown, "# Heading\n\nJust text");
}

#[test]
fn test_load_draft_reads_file_and_reports_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("foo_devto_20240101_120000.md");
    write(&path, "---\ntitle: From Disk\n---\n\nBody").unwrap();

    let draft = load_draft(&path, false).unwrap();
    assert_eq!(draft.title, "From Disk");

    let missing = dir.path().join("missing.md");
    let err = load_draft(&missing, false).unwrap_err();
    assert!(matches!(err, PublishError::File(_)));
}

#[test]
fn test_malformed_metadata_is_reported() {
    // A block that is not YAML at all is treated as plain body.
    let draft = draft_from_text("---\ntitle: [unclosed\n---\n\nBody", false).unwrap();
    assert_eq!(draft.title, UNTITLED);

    let err = draft_from_text("---\ntitle: T\npublished: maybe\n---\n\nBody", false).unwrap_err();
    assert!(matches!(err, PublishError::Metadata(_)));
}
