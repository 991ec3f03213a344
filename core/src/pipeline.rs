//! Pipeline orchestrator: fetch the attachment into a transient artifact, upload
//! it, format exactly one reply, deliver it. Every failure is absorbed within the
//! invocation; the artifact guard cleans up the local file on every path.

use tracing::{error, info};

use crate::config::Config;
use crate::im::log::truncate_content_default;
use crate::im::transport::{AttachmentSource, ReplySink};
use crate::reply;
use crate::store::ArtifactStore;
use crate::upload::{UploadClient, UploadOutcome};

/// Outbound reply, built once per invocation and delivered exactly once.
#[derive(Debug)]
pub enum ReplyMessage {
    Html(String),
    Text(String),
}

/// Composes the artifact store, upload client and reply formatter for one bot
/// process. Invocations share nothing but this immutable state, so any number of
/// them may run concurrently.
pub struct UploadPipeline {
    store: ArtifactStore,
    uploader: UploadClient,
    base_url: String,
}

impl UploadPipeline {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            store: ArtifactStore::new(config.working_dir.clone()),
            uploader: UploadClient::new(config)?,
            base_url: config.api_base_url.clone(),
        })
    }

    /// Handle one inbound attachment end to end. Always delivers exactly one reply
    /// and never lets a failure escape to the caller; the transient file is gone
    /// when this returns, whatever happened.
    pub async fn handle_attachment(&self, source: &dyn AttachmentSource, sink: &dyn ReplySink) {
        let message = self.process(source).await;

        let delivery = match &message {
            ReplyMessage::Html(html) => sink.reply_html(html).await,
            ReplyMessage::Text(text) => sink.reply_text(text).await,
        };
        match delivery {
            Ok(()) => info!("reply delivered"),
            Err(e) => error!(error = %e, "failed to deliver reply"),
        }
    }

    /// Fetch, upload and format. The artifact guard acquired here is dropped on
    /// every return path, so the local file never outlives the invocation.
    async fn process(&self, source: &dyn AttachmentSource) -> ReplyMessage {
        let artifact = match self.store.acquire(source).await {
            Ok(artifact) => artifact,
            Err(e) => {
                error!(error = %e, "attachment fetch failed");
                return ReplyMessage::Text(reply::fetch_failure_message());
            }
        };

        match self.uploader.upload(&artifact).await {
            Ok(UploadOutcome::Success(urls)) => {
                ReplyMessage::Html(reply::success_message(&urls, &self.base_url))
            }
            Ok(UploadOutcome::NonSuccessStatus { status, body }) => {
                error!(
                    file = artifact.file_name(),
                    status = status.as_u16(),
                    body = %truncate_content_default(&body),
                    "upload rejected by the image host"
                );
                ReplyMessage::Text(reply::failure_message(&format!(
                    "the hosting service returned status {}",
                    status.as_u16()
                )))
            }
            Ok(UploadOutcome::Unparseable { .. }) => {
                // Already logged at info level where the parse failed.
                ReplyMessage::Text(reply::failure_message(
                    "the hosting service returned an unreadable response",
                ))
            }
            Ok(UploadOutcome::LogicalFailure { status }) => {
                error!(file = artifact.file_name(), status = %status, "image host reported failure");
                ReplyMessage::Text(reply::failure_message(&status))
            }
            Err(e) => {
                error!(file = artifact.file_name(), "error during image upload: {e:#}");
                ReplyMessage::Text(reply::failure_message(&format!("unexpected error: {e:#}")))
            }
        }
    }
}
