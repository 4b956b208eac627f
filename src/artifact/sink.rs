use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Artifact, ArtifactError};
use crate::dom::{DocumentError, DocumentHandle, SharedDocument};

/// Capability to persist a packaged artifact.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, artifact: &Artifact) -> Result<(), ArtifactError>;
}

/// Triggers a download the way a user would: a temporary `<a download>` is
/// attached to the document, clicked and removed again.
pub struct AnchorDownloadSink<D: DocumentHandle> {
    document: SharedDocument<D>,
}

impl<D: DocumentHandle> AnchorDownloadSink<D> {
    pub fn new(document: SharedDocument<D>) -> Self {
        Self { document }
    }
}

#[async_trait]
impl<D: DocumentHandle + 'static> ArtifactSink for AnchorDownloadSink<D> {
    async fn save(&self, artifact: &Artifact) -> Result<(), ArtifactError> {
        let mut doc = self.document.lock();
        let parent = doc
            .body()
            .or_else(|| doc.document_element())
            .ok_or_else(|| DocumentError::HierarchyRequest("Document has no element to attach the link to".into()))?;
        let link = doc.create_element("a");
        doc.append_child(parent, link)?;
        doc.set_attribute(link, "download", &artifact.filename)?;
        doc.set_attribute(link, "href", &artifact.blob.url)?;
        let clicked = doc.dispatch_click(link);
        doc.remove(link)?;
        clicked?;
        tracing::debug!(filename = %artifact.filename, "Download triggered");
        Ok(())
    }
}

/// Writes artifacts into a directory, creating it when missing.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination of `filename`, with path separators neutralized so the
    /// artifact can never escape the directory.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, ArtifactError> {
        let sanitized = sanitize_filename(filename);
        if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
            return Err(ArtifactError::InvalidFilename(filename.to_string()));
        }
        Ok(self.dir.join(sanitized))
    }
}

fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(&self, artifact: &Artifact) -> Result<(), ArtifactError> {
        let path = self.path_for(&artifact.filename)?;
        let io_error = |e: std::io::Error| ArtifactError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;
        tokio::fs::write(&path, &artifact.blob.bytes)
            .await
            .map_err(io_error)?;
        tracing::info!(path = %path.display(), bytes = artifact.blob.bytes.len(), "Artifact saved");
        Ok(())
    }
}
