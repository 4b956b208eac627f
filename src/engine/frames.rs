//! Frame-tree providers: capture data harvested from nested documents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::canvas::snapshot_canvases;
use crate::capture::CanvasSnapshot;
use crate::dom::{doctype_string, parse_html, DocumentError, DocumentHandle, SharedDocument};

/// Nesting limit for harvested frames.
pub const MAX_FRAME_DEPTH: usize = 8;

const SRCDOC_URL: &str = "about:srcdoc";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameTreeError {
    #[error("Frame {key} is nested deeper than {max} levels")]
    TooDeep { key: String, max: usize },
    #[error("Failed to read frame document: {0}")]
    Document(#[from] DocumentError),
}

/// Capture data of one nested document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameData {
    /// Dotted position of the frame: `0`, `1`, `0.2`, ...
    pub key: String,
    pub url: String,
    pub content: String,
    pub canvas_data: Vec<Option<CanvasSnapshot>>,
}

impl FrameData {
    pub fn depth(&self) -> usize {
        self.key.split('.').count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FramesData(pub Vec<FrameData>);

impl FramesData {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&FrameData> {
        self.0.iter().find(|frame| frame.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameData> {
        self.0.iter()
    }
}

#[async_trait]
pub trait FrameTreeProvider: Send + Sync {
    async fn frames_data(&self) -> Result<FramesData, FrameTreeError>;
}

/// Returns the same data for every capture.
#[derive(Debug, Clone, Default)]
pub struct StaticFrameTree(pub FramesData);

#[async_trait]
impl FrameTreeProvider for StaticFrameTree {
    async fn frames_data(&self) -> Result<FramesData, FrameTreeError> {
        Ok(self.0.clone())
    }
}

/// Harvests `<iframe srcdoc>` documents of a page, recursively.
///
/// Keys are positional over every `<iframe>` of the parent document, so
/// `1.0` is the first iframe inside the second iframe of the page. Frames
/// without `srcdoc` are not same-process and are skipped.
pub struct SrcdocFrameTree<D: DocumentHandle> {
    document: SharedDocument<D>,
}

impl<D: DocumentHandle> SrcdocFrameTree<D> {
    pub fn new(document: SharedDocument<D>) -> Self {
        Self { document }
    }
}

#[async_trait]
impl<D: DocumentHandle + 'static> FrameTreeProvider for SrcdocFrameTree<D> {
    async fn frames_data(&self) -> Result<FramesData, FrameTreeError> {
        let mut frames = Vec::new();
        harvest(&*self.document.lock(), "", 1, &mut frames)?;
        tracing::debug!(count = frames.len(), "Harvested frames");
        Ok(FramesData(frames))
    }
}

fn harvest<D: DocumentHandle + ?Sized>(
    doc: &D,
    prefix: &str,
    depth: usize,
    out: &mut Vec<FrameData>,
) -> Result<(), FrameTreeError> {
    for (position, iframe) in doc.elements_by_tag("iframe").into_iter().enumerate() {
        let Some(srcdoc) = doc.attribute(iframe, "srcdoc") else {
            continue;
        };
        let key = if prefix.is_empty() {
            position.to_string()
        } else {
            format!("{prefix}.{position}")
        };
        if depth > MAX_FRAME_DEPTH {
            return Err(FrameTreeError::TooDeep {
                key,
                max: MAX_FRAME_DEPTH,
            });
        }
        let frame = parse_html(srcdoc, SRCDOC_URL)?;
        let markup = frame
            .document_element()
            .map(|root| frame.outer_html(root))
            .unwrap_or_default();
        out.push(FrameData {
            key: key.clone(),
            url: SRCDOC_URL.to_string(),
            content: doctype_string(frame.doctype()) + &markup,
            canvas_data: snapshot_canvases(&frame),
        });
        harvest(&frame, &key, depth + 1, out)?;
    }
    Ok(())
}
