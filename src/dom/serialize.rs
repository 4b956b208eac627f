//! HTML serialization of document nodes.

use super::{DocumentHandle, DocumentType, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "script",
    "style",
    "xmp",
];

/// Render a doctype node the way it must be prepended to `outerHTML`.
///
/// Returns an empty string when the document has no doctype.
pub fn doctype_string(doctype: Option<&DocumentType>) -> String {
    let Some(doctype) = doctype else {
        return String::new();
    };

    let mut out = format!("<!DOCTYPE {}", doctype.name);
    if !doctype.public_id.is_empty() {
        out.push_str(&format!(" PUBLIC \"{}\"", doctype.public_id));
        if !doctype.system_id.is_empty() {
            out.push_str(&format!(" \"{}\"", doctype.system_id));
        }
    } else if !doctype.system_id.is_empty() {
        out.push_str(&format!(" SYSTEM \"{}\"", doctype.system_id));
    }
    if !doctype.internal_subset.is_empty() {
        out.push_str(&format!(" [{}]", doctype.internal_subset));
    }
    out.push_str(">\n");
    out
}

/// `outerHTML` of a node. For the document node this is the markup of all
/// its children (the doctype is rendered separately by [`doctype_string`]).
pub fn outer_html<D: DocumentHandle + ?Sized>(doc: &D, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, false, &mut out);
    out
}

fn write_node<D: DocumentHandle + ?Sized>(doc: &D, node: NodeId, raw_text: bool, out: &mut String) {
    match doc.node_kind(node) {
        Some(NodeKind::Document) => {
            for child in doc.children(node) {
                write_node(doc, child, false, out);
            }
        }
        Some(NodeKind::Element) => {
            let tag = doc.tag_name(node).unwrap_or_default().to_string();
            out.push('<');
            out.push_str(&tag);
            for (name, value) in doc.attributes(node) {
                out.push(' ');
                out.push_str(&name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(&value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
            for child in doc.children(node) {
                write_node(doc, child, raw, out);
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
        Some(NodeKind::Text) => {
            let text = doc.text_content(node);
            if raw_text {
                out.push_str(&text);
            } else {
                out.push_str(&escape_text(&text));
            }
        }
        Some(NodeKind::Comment) => {
            out.push_str("<!--");
            out.push_str(&doc.text_content(node));
            out.push_str("-->");
        }
        None => {}
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
