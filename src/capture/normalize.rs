//! Document normalization applied before the snapshot is taken.
//!
//! Script fencing and `<noscript>` relocation are one-way: they are not
//! reverted after the capture. Frame hiding only flips the `hidden` flag.

use std::sync::OnceLock;

use regex::Regex;

use crate::dom::{DocumentError, DocumentHandle, NodeId};

const ESCAPED_CLOSING_SCRIPT: &str = "<\\/script>";

fn closing_script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)</script>").expect("closing script pattern is valid"))
}

/// Counts of elements touched by [`normalize_document`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub fenced_scripts: usize,
    pub relocated_noscripts: usize,
}

/// Fence inline scripts and move head `<noscript>` elements into the body.
pub fn normalize_document<D: DocumentHandle + ?Sized>(
    doc: &mut D,
) -> Result<NormalizeReport, DocumentError> {
    Ok(NormalizeReport {
        fenced_scripts: fence_inline_scripts(doc)?,
        relocated_noscripts: relocate_head_noscripts(doc)?,
    })
}

/// Escape literal `</script>` sequences inside script text so the serialized
/// markup cannot close the element early. Returns the number of rewritten scripts.
pub fn fence_inline_scripts<D: DocumentHandle + ?Sized>(doc: &mut D) -> Result<usize, DocumentError> {
    let pattern = closing_script_pattern();
    let mut rewritten = 0;
    for script in doc.elements_by_tag("script") {
        let text = doc.text_content(script);
        if !pattern.is_match(&text) {
            continue;
        }
        let fenced = pattern.replace_all(&text, ESCAPED_CLOSING_SCRIPT);
        doc.set_text_content(script, &fenced)?;
        rewritten += 1;
    }
    Ok(rewritten)
}

/// Move every `<noscript>` under the head to the start of the body,
/// preserving their relative order.
pub fn relocate_head_noscripts<D: DocumentHandle + ?Sized>(
    doc: &mut D,
) -> Result<usize, DocumentError> {
    let (Some(head), Some(body)) = (doc.head(), doc.body()) else {
        return Ok(0);
    };
    let noscripts: Vec<_> = doc
        .descendant_elements(head)
        .into_iter()
        .filter(|node| doc.tag_name(*node) == Some("noscript"))
        .collect();
    // Each insertion goes before the current first child, so walk backwards
    // to keep document order.
    for noscript in noscripts.iter().rev() {
        let first = doc.first_child(body);
        doc.insert_before(body, *noscript, first)?;
    }
    Ok(noscripts.len())
}

/// Hide `iframe`, `frame` and `object[type="text/html"][data]` elements in the head.
pub fn hide_head_frames<D: DocumentHandle + ?Sized>(doc: &mut D) -> Result<usize, DocumentError> {
    let Some(head) = doc.head() else {
        return Ok(0);
    };
    let frames: Vec<_> = doc
        .descendant_elements(head)
        .into_iter()
        .filter(|node| is_frame_element(&*doc, *node))
        .collect();
    for frame in &frames {
        doc.set_hidden(*frame, true)?;
    }
    Ok(frames.len())
}

fn is_frame_element<D: DocumentHandle + ?Sized>(doc: &D, node: NodeId) -> bool {
    match doc.tag_name(node) {
        Some("iframe") | Some("frame") => true,
        Some("object") => {
            doc.attribute(node, "type") == Some("text/html") && doc.attribute(node, "data").is_some()
        }
        _ => false,
    }
}
