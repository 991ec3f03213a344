//! Transient artifact store: one short-lived local file per inbound attachment.
//! Local paths are namespaced with a generated id, so concurrent invocations whose
//! attachments suggest the same filename never touch each other's files.
//! `LocalArtifact` removes its file when dropped, whatever exit path the invocation
//! took; a file that is already gone is not an error.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::im::transport::{AttachmentSource, FetchError};

const FALLBACK_FILE_NAME: &str = "attachment.bin";

/// Writes inbound attachments into a working directory and hands out drop guards
/// for them.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Fetch the attachment and write its bytes to a fresh invocation-scoped path
    /// under the working directory. A partial file left by a failed write is
    /// removed before the error is returned.
    pub async fn acquire(&self, source: &dyn AttachmentSource) -> Result<LocalArtifact, FetchError> {
        let (suggested, bytes) = source.fetch().await?;
        let file_name = sanitize_file_name(&suggested);
        let path = self.root.join(format!("{}-{}", Uuid::new_v4(), file_name));

        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            let _ = std::fs::remove_file(&path);
            return Err(FetchError::Io(e));
        }

        Ok(LocalArtifact { path, file_name })
    }
}

/// Strip any directory component from the remote-suggested name; an empty or
/// undecodable name falls back to a fixed one.
fn sanitize_file_name(suggested: &str) -> String {
    Path::new(suggested)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string()
}

/// Transient on-disk copy of one attachment, owned by a single pipeline
/// invocation. Dropping it deletes the file.
pub struct LocalArtifact {
    path: PathBuf,
    file_name: String,
}

impl LocalArtifact {
    /// Local path of the downloaded file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sanitized remote-suggested name, used as the upload form's file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Delete the local file now. Equivalent to dropping the artifact; provided
    /// for call sites that want the release to read explicitly.
    pub fn release(self) {}
}

impl Drop for LocalArtifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove transient artifact");
            }
        }
    }
}
