//! Transport abstraction between the chat platform and the pipeline: "fetch one
//! attachment" on the way in, "send one reply" on the way out. Implemented per IM
//! channel; the pipeline and its tests only see these traits.

use async_trait::async_trait;
use thiserror::Error;

/// Failure to materialize an inbound attachment.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The platform could not resolve or serve the file (network, timeout, auth).
    #[error("attachment fetch failed: {0}")]
    Remote(String),
    /// Writing the fetched bytes to the working directory failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error from delivering a reply (network, auth, etc.).
#[derive(Debug, Error)]
pub enum SendError {
    #[error("{0}")]
    Other(String),
}

/// One downloadable inbound attachment. Consumed exactly once per pipeline
/// invocation; never persisted beyond it.
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    /// Resolve the remote reference and download it: returns the remote-suggested
    /// file name (may contain directory components; callers strip them) and the
    /// raw bytes.
    async fn fetch(&self) -> Result<(String, Vec<u8>), FetchError>;
}

/// Reply channel back to the sender of one message.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver an HTML-formatted reply.
    async fn reply_html(&self, html: &str) -> Result<(), SendError>;

    /// Deliver a plain-text reply.
    async fn reply_text(&self, text: &str) -> Result<(), SendError>;
}
