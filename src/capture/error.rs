use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::dom::DocumentError;
use crate::engine::{EngineError, FrameTreeError};

/// Fatal capture failures. The `Display` rendering is what the controller
/// receives in `processError`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("No content is selected")]
    NoSelection,
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Frames(#[from] FrameTreeError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Capture task failed: {0}")]
    Task(String),
}
