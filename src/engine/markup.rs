//! Reference capture engine working on the serialized snapshot.
//!
//! It does not fetch anything: it reparses the snapshot content, applies the
//! transient markers, swaps canvases for their exported images and inlines
//! the harvested frame documents.

use async_trait::async_trait;

use super::{CaptureEngine, EngineError, EngineEvent, Page, PageProducer, ResourceProgress};
use crate::capture::annotate::{REMOVED_CONTENT_ATTRIBUTE_NAME, SELECTED_CONTENT_ATTRIBUTE_NAME};
use crate::capture::{CanvasSnapshot, CaptureOptions};
use crate::dom::{doctype_string, parse_html, DocumentError, DocumentHandle, MemoryDocument, NodeId};

const BLANK_URL: &str = "about:blank";

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupEngine;

impl MarkupEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CaptureEngine for MarkupEngine {
    async fn initialize(&self, options: CaptureOptions) -> Result<Box<dyn PageProducer>, EngineError> {
        if options.content.is_none() {
            return Err(EngineError::InvalidOptions(
                "options carry no document content".to_string(),
            ));
        }
        Ok(Box::new(MarkupProducer { options }))
    }
}

struct MarkupProducer {
    options: CaptureOptions,
}

/// A pending substitution, counted as one resource.
enum Resource<'a> {
    Canvas(NodeId, &'a CanvasSnapshot),
    Frame(NodeId, &'a str),
}

impl MarkupProducer {
    fn emit(&self, event: EngineEvent) {
        if let Some(observer) = &self.options.on_progress {
            observer.notify(event);
        }
    }

    fn render(&self) -> Result<Page, DocumentError> {
        let options = &self.options;
        let url = options.url.as_deref().unwrap_or(BLANK_URL);
        self.emit(EngineEvent::PageLoading);
        let mut doc = parse_html(options.content.as_deref().unwrap_or_default(), url)?;
        self.emit(EngineEvent::PageLoaded);

        // Positional correlation uses the snapshot order, before any pruning
        let canvases = doc.elements_by_tag("canvas");
        let iframes = doc.elements_by_tag("iframe");

        remove_marked(&mut doc)?;
        if options.selected {
            keep_selected(&mut doc)?;
        }
        for marker in [SELECTED_CONTENT_ATTRIBUTE_NAME, REMOVED_CONTENT_ATTRIBUTE_NAME] {
            for node in doc.elements_with_attribute(marker) {
                doc.remove_attribute(node, marker)?;
            }
        }

        let mut resources = Vec::new();
        if let Some(canvas_data) = &options.canvas_data {
            for (canvas, snapshot) in canvases.iter().zip(canvas_data) {
                if let Some(snapshot) = snapshot {
                    if doc.is_connected(*canvas) {
                        resources.push(Resource::Canvas(*canvas, snapshot));
                    }
                }
            }
        }
        if let Some(frames) = &options.frames_data {
            for (position, iframe) in iframes.iter().enumerate() {
                if let Some(frame) = frames.get(&position.to_string()) {
                    if doc.is_connected(*iframe) {
                        resources.push(Resource::Frame(*iframe, &frame.content));
                    }
                }
            }
        }

        let max = resources.len() as u64;
        self.emit(EngineEvent::ResourcesInitialized(ResourceProgress::new(0, max)));
        self.emit(EngineEvent::StageStarted { step: 1 });
        for (index, resource) in resources.into_iter().enumerate() {
            let index = index as u64 + 1;
            self.emit(EngineEvent::ResourceLoading(ResourceProgress::new(index, max)));
            match resource {
                Resource::Canvas(canvas, snapshot) => replace_canvas(&mut doc, canvas, snapshot)?,
                Resource::Frame(iframe, content) => {
                    doc.set_attribute(iframe, "srcdoc", content)?;
                    doc.remove_attribute(iframe, "src")?;
                }
            }
            self.emit(EngineEvent::ResourceLoaded(ResourceProgress::new(index, max)));
        }
        self.emit(EngineEvent::StageEnded { step: 1 });

        if options.remove_scripts {
            for script in doc.elements_by_tag("script") {
                doc.remove(script)?;
            }
        }

        let title = page_title(&doc).unwrap_or_else(|| url.to_string());
        let markup = doc
            .document_element()
            .map(|root| doc.outer_html(root))
            .unwrap_or_default();
        let content = doctype_string(doc.doctype()) + &markup;
        self.emit(EngineEvent::PageEnded);
        Ok(Page::new(title, content))
    }
}

#[async_trait]
impl PageProducer for MarkupProducer {
    async fn produce(self: Box<Self>) -> Result<Page, EngineError> {
        self.render()
            .map_err(|e| EngineError::Production(e.to_string()))
    }
}

/// Drop every subtree tagged as having no visual presence.
fn remove_marked(doc: &mut MemoryDocument) -> Result<(), DocumentError> {
    for node in doc.elements_with_attribute(REMOVED_CONTENT_ATTRIBUTE_NAME) {
        doc.remove(node)?;
    }
    Ok(())
}

/// Replace the body content by the selected element. Nothing changes when
/// the selection covers the whole body.
fn keep_selected(doc: &mut MemoryDocument) -> Result<(), DocumentError> {
    let Some(selected) = doc
        .elements_with_attribute(SELECTED_CONTENT_ATTRIBUTE_NAME)
        .into_iter()
        .next()
    else {
        tracing::warn!("No selected content in snapshot, keeping the full page");
        return Ok(());
    };
    let Some(body) = doc.body() else {
        return Ok(());
    };
    if doc.common_ancestor(selected, body) == Some(selected) {
        return Ok(());
    }
    for child in doc.children(body) {
        doc.remove(child)?;
    }
    doc.append_child(body, selected)
}

fn replace_canvas(
    doc: &mut MemoryDocument,
    canvas: NodeId,
    snapshot: &CanvasSnapshot,
) -> Result<(), DocumentError> {
    let Some(parent) = doc.parent(canvas) else {
        return Ok(());
    };
    let image = doc.create_element("img");
    for (name, value) in doc.attributes(canvas) {
        if name != "width" && name != "height" {
            doc.set_attribute(image, &name, &value)?;
        }
    }
    doc.set_attribute(image, "src", &snapshot.data_uri)?;
    doc.set_attribute(image, "width", &snapshot.width.to_string())?;
    doc.set_attribute(image, "height", &snapshot.height.to_string())?;
    doc.insert_before(parent, image, Some(canvas))?;
    doc.remove(canvas)
}

fn page_title(doc: &MemoryDocument) -> Option<String> {
    doc.elements_by_tag("title")
        .into_iter()
        .next()
        .map(|title| doc.text_content(title).trim().to_string())
        .filter(|title| !title.is_empty())
}
