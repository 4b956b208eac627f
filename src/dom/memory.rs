//! Arena-backed in-memory document.
//!
//! There is no layout engine behind this document, so rendering queries are
//! approximations: computed style comes from the `hidden` attribute, a small
//! user-agent table and inline `style` declarations, and client sizes come
//! from explicit overrides, inline/attribute dimensions or a nominal box for
//! elements with rendered content.

use std::collections::HashMap;
use std::io::Cursor;

use base64::engine::general_purpose;
use base64::Engine as _;

use super::style;
use super::{
    BoundaryPoint, ClientSize, ComputedStyle, DocumentError, DocumentHandle, DocumentType,
    NodeId, NodeKind, SelectionRange, Visibility,
};

/// Elements the user-agent stylesheet renders with `display: none`.
const UA_HIDDEN_ELEMENTS: &[&str] = &[
    "base", "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "div", "dl", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "html", "main", "nav",
    "ol", "p", "pre", "section", "table", "ul",
];

/// Elements that occupy space even without text content.
const REPLACED_ELEMENTS: &[&str] = &[
    "button", "canvas", "embed", "iframe", "img", "input", "object", "select", "svg", "textarea",
    "video",
];

/// Size reported for elements with rendered content but no explicit dimensions.
const NOMINAL_SIZE: ClientSize = ClientSize {
    width: 300,
    height: 18,
};

/// Default canvas bitmap size per the HTML standard.
const DEFAULT_CANVAS_WIDTH: u32 = 300;
const DEFAULT_CANVAS_HEIGHT: u32 = 150;
/// Largest exportable canvas area in pixels, the same bound Chromium applies.
pub const MAX_CANVAS_AREA: u64 = 16_384 * 16_384;

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeSlot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Pixel buffer backing a `<canvas>` element.
#[derive(Debug, Clone)]
pub struct CanvasBitmap {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major, `width * height * 4` bytes
    pub pixels: Vec<u8>,
    /// Cross-origin content was drawn; exports fail with a security error
    pub tainted: bool,
}

impl CanvasBitmap {
    /// A bitmap of one color. Bitmaps larger than [`MAX_CANVAS_AREA`] get no
    /// pixels and fail to export.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let len = pixel_buffer_len(width, height).unwrap_or(0);
        let pixels = rgba.iter().copied().cycle().take(len).collect();
        Self {
            width,
            height,
            pixels,
            tainted: false,
        }
    }

    pub fn tainted(mut self) -> Self {
        self.tainted = true;
        self
    }
}

/// RGBA8 buffer length for a `width` x `height` bitmap, `None` above the area cap.
fn pixel_buffer_len(width: u32, height: u32) -> Option<usize> {
    let area = u64::from(width).checked_mul(u64::from(height))?;
    if area > MAX_CANVAS_AREA {
        return None;
    }
    usize::try_from(area).ok()?.checked_mul(4)
}

/// A synthetic click observed by the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickRecord {
    pub node: NodeId,
    pub tag: String,
    pub download: Option<String>,
    pub href: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<NodeSlot>,
    doctype: Option<DocumentType>,
    location: String,
    selection: Option<SelectionRange>,
    client_sizes: HashMap<NodeId, ClientSize>,
    canvases: HashMap<NodeId, CanvasBitmap>,
    clicks: Vec<ClickRecord>,
}

impl MemoryDocument {
    /// A document with no children at all.
    pub fn empty(location: impl Into<String>) -> Self {
        Self {
            nodes: vec![NodeSlot {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            doctype: None,
            location: location.into(),
            selection: None,
            client_sizes: HashMap::new(),
            canvases: HashMap::new(),
            clicks: Vec::new(),
        }
    }

    /// An HTML5 document with an empty `<html><head></head><body></body></html>` skeleton.
    pub fn new(location: impl Into<String>) -> Self {
        let mut doc = Self::empty(location);
        doc.doctype = Some(DocumentType::html());
        let root = doc.root();
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.attach(root, html, None);
        doc.attach(html, head, None);
        doc.attach(html, body, None);
        doc
    }

    pub fn set_doctype(&mut self, doctype: Option<DocumentType>) {
        self.doctype = doctype;
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    /// Create an element, append it to `parent` and return it.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DocumentError> {
        let element = self.create_element(tag);
        self.insert_before(parent, element, None)?;
        Ok(element)
    }

    /// Append a text node to `parent` and return it.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DocumentError> {
        let node = self.create_text(text);
        self.insert_before(parent, node, None)?;
        Ok(node)
    }

    /// Pin the rendered size of an element, bypassing the layout approximation.
    pub fn set_client_size(&mut self, node: NodeId, size: ClientSize) {
        self.client_sizes.insert(node, size);
    }

    pub fn set_canvas_bitmap(&mut self, node: NodeId, bitmap: CanvasBitmap) {
        self.canvases.insert(node, bitmap);
    }

    pub fn set_selection(&mut self, range: Option<SelectionRange>) {
        self.selection = range;
    }

    /// Select everything inside `node`, like `Range.selectNodeContents`.
    pub fn select_node_contents(&mut self, node: NodeId) {
        let len = match self.slot(node).map(|slot| &slot.data) {
            Some(NodeData::Text(text)) | Some(NodeData::Comment(text)) => text.chars().count(),
            Some(_) => self.children(node).len(),
            None => 0,
        };
        self.selection = Some(SelectionRange::new(
            BoundaryPoint { node, offset: 0 },
            BoundaryPoint { node, offset: len },
        ));
    }

    /// Synthetic clicks dispatched so far, oldest first.
    pub fn clicks(&self) -> &[ClickRecord] {
        &self.clicks
    }

    /// Whether `node` is reachable from the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root() {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSlot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn slot(&self, node: NodeId) -> Option<&NodeSlot> {
        self.nodes.get(node.0)
    }

    fn slot_mut(&mut self, node: NodeId) -> Result<&mut NodeSlot, DocumentError> {
        self.nodes
            .get_mut(node.0)
            .ok_or(DocumentError::NodeNotFound(node.0))
    }

    fn element_attrs_mut(
        &mut self,
        node: NodeId,
    ) -> Result<&mut Vec<(String, String)>, DocumentError> {
        match &mut self.slot_mut(node)?.data {
            NodeData::Element { attrs, .. } => Ok(attrs),
            _ => Err(DocumentError::NotAnElement(node.0)),
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let position = reference
            .and_then(|reference| children.iter().position(|c| *c == reference))
            .unwrap_or(children.len());
        children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn inline_style(&self, node: NodeId, property: &str) -> Option<String> {
        self.attribute(node, "style")
            .and_then(|css| style::property(css, property))
    }

    fn display_of(&self, node: NodeId) -> String {
        let Some(tag) = self.tag_name(node) else {
            return "inline".to_string();
        };
        if let Some(display) = self.inline_style(node, "display") {
            return display.to_ascii_lowercase();
        }
        if self.is_hidden(node) || UA_HIDDEN_ELEMENTS.contains(&tag) {
            "none".to_string()
        } else if BLOCK_ELEMENTS.contains(&tag) {
            "block".to_string()
        } else {
            "inline".to_string()
        }
    }

    fn visibility_of(&self, node: NodeId) -> Visibility {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(visibility) = self
                .inline_style(id, "visibility")
                .and_then(|value| Visibility::parse(&value))
            {
                return visibility;
            }
            current = self.parent_element(id);
        }
        Visibility::Visible
    }

    fn rendered_dimension(&self, node: NodeId, property: &str) -> Option<u32> {
        self.inline_style(node, property)
            .and_then(|value| style::parse_px(&value))
            .or_else(|| {
                self.attribute(node, property)
                    .and_then(style::parse_px)
            })
    }

    fn has_rendered_content(&self, node: NodeId) -> bool {
        if self
            .tag_name(node)
            .is_some_and(|tag| REPLACED_ELEMENTS.contains(&tag))
        {
            return true;
        }
        self.children(node).into_iter().any(|child| match self.node_kind(child) {
            Some(NodeKind::Text) => !self.text_content(child).trim().is_empty(),
            Some(NodeKind::Element) => {
                self.display_of(child) != "none" && self.has_rendered_content(child)
            }
            _ => false,
        })
    }

    /// Bitmap size without materializing pixels: the painted bitmap, else
    /// the `width`/`height` attributes.
    fn canvas_dimensions(&self, node: NodeId) -> (u32, u32) {
        if let Some(bitmap) = self.canvases.get(&node) {
            return (bitmap.width, bitmap.height);
        }
        let width = self
            .attribute(node, "width")
            .and_then(style::parse_px)
            .unwrap_or(DEFAULT_CANVAS_WIDTH);
        let height = self
            .attribute(node, "height")
            .and_then(style::parse_px)
            .unwrap_or(DEFAULT_CANVAS_HEIGHT);
        (width, height)
    }
}

impl DocumentHandle for MemoryDocument {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn location(&self) -> String {
        self.location.clone()
    }

    fn doctype(&self) -> Option<&DocumentType> {
        self.doctype.as_ref()
    }

    fn node_kind(&self, node: NodeId) -> Option<NodeKind> {
        self.slot(node).map(|slot| match slot.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        })
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.slot(node)?.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).and_then(|slot| slot.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.slot(node)
            .map(|slot| slot.children.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.slot(node)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        match self.slot(node).map(|slot| &slot.data) {
            Some(NodeData::Element { attrs, .. }) => attrs.clone(),
            _ => Vec::new(),
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DocumentError> {
        let name = name.to_ascii_lowercase();
        let attrs = self.element_attrs_mut(node)?;
        match attrs.iter_mut().find(|(attr, _)| *attr == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attrs.push((name, value.to_string())),
        }
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError> {
        let attrs = self.element_attrs_mut(node)?;
        attrs.retain(|(attr, _)| !attr.eq_ignore_ascii_case(name));
        Ok(())
    }

    fn text_content(&self, node: NodeId) -> String {
        match self.slot(node).map(|slot| &slot.data) {
            Some(NodeData::Text(text)) | Some(NodeData::Comment(text)) => text.clone(),
            Some(_) => {
                let mut out = String::new();
                let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
                while let Some(id) = stack.pop() {
                    match &self.nodes[id.0].data {
                        NodeData::Text(text) => out.push_str(text),
                        NodeData::Element { .. } => {
                            stack.extend(self.children(id).into_iter().rev())
                        }
                        _ => {}
                    }
                }
                out
            }
            None => String::new(),
        }
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError> {
        if let NodeData::Text(data) | NodeData::Comment(data) = &mut self.slot_mut(node)?.data {
            *data = text.to_string();
            return Ok(());
        }
        for child in self.children(node) {
            self.detach(child);
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.attach(node, text_node, None);
        }
        Ok(())
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DocumentError> {
        match self.node_kind(parent) {
            Some(NodeKind::Element) | Some(NodeKind::Document) => {}
            Some(_) => {
                return Err(DocumentError::HierarchyRequest(format!(
                    "node {} cannot have children",
                    parent.0
                )))
            }
            None => return Err(DocumentError::NodeNotFound(parent.0)),
        }
        match self.node_kind(child) {
            Some(NodeKind::Document) => {
                return Err(DocumentError::HierarchyRequest(
                    "the document node cannot be inserted".to_string(),
                ))
            }
            Some(_) => {}
            None => return Err(DocumentError::NodeNotFound(child.0)),
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DocumentError::HierarchyRequest(format!(
                "node {} is an ancestor of node {}",
                child.0, parent.0
            )));
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DocumentError::HierarchyRequest(format!(
                    "node {} is not a child of node {}",
                    reference.0, parent.0
                )));
            }
            if reference == child {
                return Ok(());
            }
        }
        self.attach(parent, child, reference);
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> Result<(), DocumentError> {
        if self.slot(node).is_none() {
            return Err(DocumentError::NodeNotFound(node.0));
        }
        self.detach(node);
        Ok(())
    }

    fn computed_style(&self, node: NodeId) -> ComputedStyle {
        if !self.is_element(node) {
            return ComputedStyle::default();
        }
        let opacity = self
            .inline_style(node, "opacity")
            .and_then(|value| style::parse_opacity(&value))
            .unwrap_or(1.0);
        ComputedStyle {
            display: self.display_of(node),
            visibility: self.visibility_of(node),
            opacity,
        }
    }

    fn client_size(&self, node: NodeId) -> ClientSize {
        if let Some(size) = self.client_sizes.get(&node) {
            return *size;
        }
        if !self.is_element(node) {
            return ClientSize::default();
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if self.display_of(id) == "none" {
                return ClientSize::default();
            }
            current = self.parent_element(id);
        }
        if self.tag_name(node) == Some("canvas") {
            let (width, height) = self.canvas_dimensions(node);
            return ClientSize::new(
                self.rendered_dimension(node, "width").unwrap_or(width),
                self.rendered_dimension(node, "height").unwrap_or(height),
            );
        }
        let fallback = if self.has_rendered_content(node) {
            NOMINAL_SIZE
        } else {
            ClientSize::default()
        };
        ClientSize::new(
            self.rendered_dimension(node, "width")
                .unwrap_or(fallback.width),
            self.rendered_dimension(node, "height")
                .unwrap_or(fallback.height),
        )
    }

    fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    fn canvas_to_data_uri(&self, node: NodeId, _mime: &str) -> Result<String, DocumentError> {
        if self.tag_name(node) != Some("canvas") {
            return Err(DocumentError::NotAnElement(node.0));
        }
        if self.canvases.get(&node).is_some_and(|bitmap| bitmap.tainted) {
            return Err(DocumentError::Security(
                "the canvas has been tainted by cross-origin data".to_string(),
            ));
        }
        let (width, height) = self.canvas_dimensions(node);
        if width == 0 || height == 0 {
            return Ok("data:,".to_string());
        }
        if pixel_buffer_len(width, height).is_none() {
            return Err(DocumentError::Encoding(format!(
                "canvas of {width}x{height} exceeds the maximum area of {MAX_CANVAS_AREA} pixels"
            )));
        }
        let pixels = match self.canvases.get(&node) {
            Some(bitmap) => bitmap.pixels.clone(),
            None => CanvasBitmap::filled(width, height, [0, 0, 0, 0]).pixels,
        };
        // Only PNG is encoded; other types fall back to it like browsers do.
        let image = image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| {
                DocumentError::Encoding(format!(
                    "pixel buffer does not match {width}x{height}"
                ))
            })?;
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| DocumentError::Encoding(e.to_string()))?;
        Ok(format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png)
        ))
    }

    fn dispatch_click(&mut self, node: NodeId) -> Result<(), DocumentError> {
        let tag = self
            .tag_name(node)
            .ok_or(DocumentError::NotAnElement(node.0))?
            .to_string();
        let record = ClickRecord {
            node,
            tag,
            download: self.attribute(node, "download").map(String::from),
            href: self.attribute(node, "href").map(String::from),
        };
        tracing::trace!(node = node.0, tag = %record.tag, "Synthetic click dispatched");
        self.clicks.push(record);
        Ok(())
    }
}
