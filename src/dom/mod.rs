//! Document model used by the capture pipeline.
//!
//! Every pipeline component talks to the page through [`DocumentHandle`], so
//! the orchestrator never touches a concrete DOM. [`MemoryDocument`] is the
//! in-process implementation used by the binary and by tests.

pub mod memory;
pub mod parse;
pub mod serialize;
mod style;

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

pub use memory::{CanvasBitmap, ClickRecord, MemoryDocument};
pub use parse::parse_html;
pub use serialize::doctype_string;

/// Document shared between the orchestrator and the collaborators that need
/// it (frame harvesting, anchor downloads). Only lock inside synchronous code.
pub type SharedDocument<D> = Arc<Mutex<D>>;

/// Wrap a document so it can be handed to the orchestrator.
pub fn shared<D: DocumentHandle>(document: D) -> SharedDocument<D> {
    Arc::new(Mutex::new(document))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Node {0} does not exist")]
    NodeNotFound(usize),
    #[error("Node {0} is not an element")]
    NotAnElement(usize),
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),
    #[error("Security error: {0}")]
    Security(String),
    #[error("Failed to encode canvas: {0}")]
    Encoding(String),
    #[error("Failed to parse HTML: {0}")]
    Parse(String),
}

/// Opaque node reference, stable for the lifetime of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
}

/// The `<!DOCTYPE>` node of a document. Empty strings mean "absent", as in the DOM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentType {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
    pub internal_subset: String,
}

impl DocumentType {
    pub fn html() -> Self {
        Self {
            name: "html".to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

impl Visibility {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "visible" => Some(Visibility::Visible),
            "hidden" => Some(Visibility::Hidden),
            "collapse" => Some(Visibility::Collapse),
            _ => None,
        }
    }
}

/// Subset of the computed style the pipeline inspects.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    /// Computed `display` keyword, lowercase
    pub display: String,
    pub visibility: Visibility,
    pub opacity: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "inline".to_string(),
            visibility: Visibility::Visible,
            opacity: 1.0,
        }
    }
}

impl ComputedStyle {
    pub fn is_display_none(&self) -> bool {
        self.display == "none"
    }
}

/// Rendered inner size of an element (`clientWidth` / `clientHeight`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientSize {
    pub width: u32,
    pub height: u32,
}

impl ClientSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

/// First range of the active selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl SelectionRange {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    /// Same container and same offset. Equal offsets in different
    /// containers still span content, unlike an offset-only comparison.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Synchronous access to a live document.
///
/// Query methods return nodes in document order. Only the connected tree
/// (reachable from [`DocumentHandle::root`]) is visible to queries; removed
/// nodes stay addressable but are never returned.
pub trait DocumentHandle: Send {
    /// The document node itself
    fn root(&self) -> NodeId;

    /// `document.location.href`
    fn location(&self) -> String;

    fn doctype(&self) -> Option<&DocumentType>;

    fn node_kind(&self, node: NodeId) -> Option<NodeKind>;

    /// Lowercase local name for elements, `None` for other nodes
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DocumentError>;

    /// Removing an absent attribute is not an error.
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError>;

    fn text_content(&self, node: NodeId) -> String;

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError>;

    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Insert `child` into `parent` before `reference`, or last when
    /// `reference` is `None`. An attached `child` is moved.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DocumentError>;

    /// Detach a node from its parent.
    fn remove(&mut self, node: NodeId) -> Result<(), DocumentError>;

    fn computed_style(&self, node: NodeId) -> ComputedStyle;

    fn client_size(&self, node: NodeId) -> ClientSize;

    fn selection(&self) -> Option<SelectionRange>;

    /// `canvas.toDataURL(mime)`. Fails with [`DocumentError::Security`] on
    /// tainted canvases.
    fn canvas_to_data_uri(&self, node: NodeId, mime: &str) -> Result<String, DocumentError>;

    /// Dispatch a synthetic primary-button click on an element.
    fn dispatch_click(&mut self, node: NodeId) -> Result<(), DocumentError>;

    fn is_element(&self, node: NodeId) -> bool {
        self.node_kind(node) == Some(NodeKind::Element)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|parent| self.is_element(*parent))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.insert_before(parent, child, None)
    }

    fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .into_iter()
            .find(|child| self.is_element(*child))
    }

    fn head(&self) -> Option<NodeId> {
        self.document_element().and_then(|html| {
            self.children(html)
                .into_iter()
                .find(|child| self.tag_name(*child) == Some("head"))
        })
    }

    fn body(&self) -> Option<NodeId> {
        self.document_element().and_then(|html| {
            self.children(html)
                .into_iter()
                .find(|child| self.tag_name(*child) == Some("body"))
        })
    }

    /// Descendant elements of `root` in document order, `root` excluded.
    fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.is_element(node) {
                out.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }

    fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendant_elements(self.root())
            .into_iter()
            .filter(|node| {
                self.tag_name(*node)
                    .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            })
            .collect()
    }

    fn elements_with_attribute(&self, name: &str) -> Vec<NodeId> {
        self.descendant_elements(self.root())
            .into_iter()
            .filter(|node| self.attribute(*node, name).is_some())
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendant_elements(self.root())
            .into_iter()
            .find(|node| self.attribute(*node, "id") == Some(id))
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        self.attribute(node, "hidden").is_some()
    }

    fn set_hidden(&mut self, node: NodeId, hidden: bool) -> Result<(), DocumentError> {
        if hidden {
            self.set_attribute(node, "hidden", "")
        } else {
            self.remove_attribute(node, "hidden")
        }
    }

    /// Deepest node containing both `a` and `b`, inclusive.
    fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = Some(a);
        while let Some(node) = current {
            ancestors.push(node);
            current = self.parent(node);
        }
        let mut current = Some(b);
        while let Some(node) = current {
            if ancestors.contains(&node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Markup of `node` including the node itself (`outerHTML`).
    fn outer_html(&self, node: NodeId) -> String {
        serialize::outer_html(self, node)
    }
}
