//! End-to-end pipeline scenarios against a mock image host: success, fetch
//! failure, non-200, malformed body, logical failure, and concurrent invocations.
//! Every scenario checks the two pipeline-wide rules: exactly one reply is
//! delivered, and no transient artifact survives the invocation.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use common::config::Config;
use common::im::transport::{AttachmentSource, FetchError, ReplySink, SendError};
use common::pipeline::UploadPipeline;
use tempfile::TempDir;

struct StaticAttachment {
    name: String,
    bytes: Vec<u8>,
}

impl StaticAttachment {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), bytes: b"jpeg-bytes".to_vec() }
    }
}

#[async_trait]
impl AttachmentSource for StaticAttachment {
    async fn fetch(&self) -> Result<(String, Vec<u8>), FetchError> {
        Ok((self.name.clone(), self.bytes.clone()))
    }
}

struct FailingAttachment;

#[async_trait]
impl AttachmentSource for FailingAttachment {
    async fn fetch(&self) -> Result<(String, Vec<u8>), FetchError> {
        Err(FetchError::Remote("network unreachable".to_string()))
    }
}

/// Records every delivered reply as ("html" | "text", message).
#[derive(Default)]
struct RecordingSink {
    replies: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingSink {
    fn replies(&self) -> Vec<(&'static str, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn reply_html(&self, html: &str) -> Result<(), SendError> {
        self.replies.lock().unwrap().push(("html", html.to_string()));
        Ok(())
    }

    async fn reply_text(&self, text: &str) -> Result<(), SendError> {
        self.replies.lock().unwrap().push(("text", text.to_string()));
        Ok(())
    }
}

fn test_config(base_url: &str, dir: &Path) -> Config {
    Config {
        bot_token: "test-token".to_string(),
        api_base_url: base_url.trim_end_matches('/').to_string(),
        api_key: "test-key".to_string(),
        working_dir: dir.to_path_buf(),
    }
}

fn dir_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

const SUCCESS_BODY: &str =
    r#"{"results":[{"status":"success","urls":{"original":"o.jpg","webp":"o.webp","avif":"o.avif"}}]}"#;

#[tokio::test]
async fn successful_upload_replies_with_all_links() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/upload")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_body(SUCCESS_BODY)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let base = server.url();
    let pipeline = UploadPipeline::new(&test_config(&base, dir.path())).unwrap();
    let sink = RecordingSink::default();

    pipeline.handle_attachment(&StaticAttachment::new("cat.jpg"), &sink).await;

    let replies = sink.replies();
    assert_eq!(replies.len(), 1, "exactly one reply per invocation");
    let (kind, message) = &replies[0];
    assert_eq!(*kind, "html");
    assert!(message.contains(&format!("{base}/o.jpg")));
    assert!(message.contains(&format!("{base}/o.webp")));
    assert!(message.contains(&format!("{base}/o.avif")));
    assert!(message.contains(&format!("![image]({base}/o.webp)")));

    assert!(dir_is_empty(&dir), "artifact must not survive the invocation");
    mock.assert_async().await;
}

#[tokio::test]
async fn fetch_failure_skips_the_upload_entirely() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/upload")
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = UploadPipeline::new(&test_config(&server.url(), dir.path())).unwrap();
    let sink = RecordingSink::default();

    pipeline.handle_attachment(&FailingAttachment, &sink).await;

    let replies = sink.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, "text");
    assert!(replies[0].1.contains("Could not fetch the image"));

    assert!(dir_is_empty(&dir));
    mock.assert_async().await;
}

#[tokio::test]
async fn http_413_is_reported_with_its_status_code() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/upload")
        .with_status(413)
        .with_body("payload too large")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = UploadPipeline::new(&test_config(&server.url(), dir.path())).unwrap();
    let sink = RecordingSink::default();

    pipeline.handle_attachment(&StaticAttachment::new("big.png"), &sink).await;

    let replies = sink.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, "text");
    assert!(replies[0].1.contains("413"));

    assert!(dir_is_empty(&dir));
    mock.assert_async().await;
}

#[tokio::test]
async fn http_500_produces_a_failure_reply_without_panicking() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/upload")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = UploadPipeline::new(&test_config(&server.url(), dir.path())).unwrap();
    let sink = RecordingSink::default();

    pipeline.handle_attachment(&StaticAttachment::new("cat.jpg"), &sink).await;

    let replies = sink.replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].1.contains("500"));
    assert!(dir_is_empty(&dir));
}

#[tokio::test]
async fn malformed_200_body_degrades_to_a_failure_reply() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/upload")
        .with_status(200)
        .with_body("this is not json")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = UploadPipeline::new(&test_config(&server.url(), dir.path())).unwrap();
    let sink = RecordingSink::default();

    pipeline.handle_attachment(&StaticAttachment::new("cat.jpg"), &sink).await;

    let replies = sink.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, "text");
    assert!(replies[0].1.contains("unreadable response"));
    assert!(dir_is_empty(&dir));
}

#[tokio::test]
async fn remote_logical_failure_names_the_remote_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/upload")
        .with_status(200)
        .with_body(r#"{"results":[{"status":"virus detected"}]}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = UploadPipeline::new(&test_config(&server.url(), dir.path())).unwrap();
    let sink = RecordingSink::default();

    pipeline.handle_attachment(&StaticAttachment::new("cat.jpg"), &sink).await;

    let replies = sink.replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].1.contains("virus detected"));
    assert!(dir_is_empty(&dir));
}

#[tokio::test]
async fn concurrent_invocations_with_the_same_filename_stay_isolated() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/upload")
        .with_status(200)
        .with_body(SUCCESS_BODY)
        .expect(2)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = UploadPipeline::new(&test_config(&server.url(), dir.path())).unwrap();
    let first_sink = RecordingSink::default();
    let second_sink = RecordingSink::default();

    let first_attachment = StaticAttachment::new("same.jpg");
    let second_attachment = StaticAttachment::new("same.jpg");
    tokio::join!(
        pipeline.handle_attachment(&first_attachment, &first_sink),
        pipeline.handle_attachment(&second_attachment, &second_sink),
    );

    assert_eq!(first_sink.replies().len(), 1);
    assert_eq!(second_sink.replies().len(), 1);
    assert_eq!(first_sink.replies()[0].0, "html");
    assert_eq!(second_sink.replies()[0].0, "html");

    assert!(dir_is_empty(&dir));
    mock.assert_async().await;
}
