//! HTML parsing into a [`MemoryDocument`].

use std::io::Cursor;

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::{DocumentError, DocumentHandle, DocumentType, MemoryDocument, NodeId};

/// Parse a full HTML document. Scripting is disabled, so `<noscript>`
/// contents are parsed as markup.
pub fn parse_html(html: &str, location: impl Into<String>) -> Result<MemoryDocument, DocumentError> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut Cursor::new(html.as_bytes()))
        .map_err(|e| DocumentError::Parse(e.to_string()))?;

    let mut doc = MemoryDocument::empty(location);
    let root = doc.root();
    for child in dom.document.children.borrow().iter() {
        convert(&mut doc, child, root)?;
    }
    Ok(doc)
}

fn convert(doc: &mut MemoryDocument, handle: &Handle, parent: NodeId) -> Result<(), DocumentError> {
    match &handle.data {
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            doc.set_doctype(Some(DocumentType {
                name: name.to_string(),
                public_id: public_id.to_string(),
                system_id: system_id.to_string(),
                internal_subset: String::new(),
            }));
        }
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let element = doc.append_element(parent, name.local.as_ref())?;
            for attr in attrs.borrow().iter() {
                doc.set_attribute(element, attr.name.local.as_ref(), &attr.value.to_string())?;
            }

            let children: Vec<Handle> = match &*template_contents.borrow() {
                Some(content) => content.children.borrow().clone(),
                None => handle.children.borrow().clone(),
            };
            for child in children.iter() {
                convert(doc, child, element)?;
            }
        }
        NodeData::Text { contents } => {
            doc.append_text(parent, &contents.borrow().to_string())?;
        }
        NodeData::Comment { contents } => {
            let comment = doc.create_comment(&contents.to_string());
            doc.append_child(parent, comment)?;
        }
        _ => {}
    }
    Ok(())
}
