//! Transient markers applied around the snapshot.
//!
//! Markers are plain attributes the capture engine reads from the serialized
//! markup. They are removed from the live document right after the snapshot.

use crate::capture::CaptureError;
use crate::dom::{DocumentError, DocumentHandle, NodeId, Visibility};

pub const SELECTED_CONTENT_ATTRIBUTE_NAME: &str = "data-single-file-selected-content";
pub const REMOVED_CONTENT_ATTRIBUTE_NAME: &str = "data-single-file-removed-content";

/// Elements never considered by hidden-element marking.
const UNMARKABLE_ELEMENTS: &[&str] = &["link", "script", "style"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Smallest element containing the active selection
    SelectedContent,
    /// Element with no visual presence
    RemovedContent,
}

impl Marker {
    pub fn attribute_name(&self) -> &'static str {
        match self {
            Marker::SelectedContent => SELECTED_CONTENT_ATTRIBUTE_NAME,
            Marker::RemovedContent => REMOVED_CONTENT_ATTRIBUTE_NAME,
        }
    }
}

/// Tag the smallest element containing the active selection.
///
/// Fails with [`CaptureError::NoSelection`] when there is no selection or it
/// is collapsed.
pub fn mark_selected_content<D: DocumentHandle + ?Sized>(doc: &mut D) -> Result<NodeId, CaptureError> {
    let range = doc
        .selection()
        .filter(|range| !range.is_collapsed())
        .ok_or(CaptureError::NoSelection)?;
    let ancestor = doc
        .common_ancestor(range.start.node, range.end.node)
        .ok_or(CaptureError::NoSelection)?;
    let element = if doc.is_element(ancestor) {
        ancestor
    } else {
        doc.parent_element(ancestor)
            .ok_or(CaptureError::NoSelection)?
    };
    doc.set_attribute(element, SELECTED_CONTENT_ATTRIBUTE_NAME, "")?;
    tracing::debug!(node = element.index(), "Marked selected content");
    Ok(element)
}

/// Tag every body element with no visual presence. Returns the number of
/// marked elements.
pub fn mark_hidden_elements<D: DocumentHandle + ?Sized>(doc: &mut D) -> Result<usize, DocumentError> {
    let Some(body) = doc.body() else {
        return Ok(0);
    };
    let hidden: Vec<NodeId> = doc
        .descendant_elements(body)
        .into_iter()
        .filter(|node| {
            doc.tag_name(*node)
                .is_some_and(|tag| !UNMARKABLE_ELEMENTS.contains(&tag))
        })
        .filter(|node| is_visually_absent(&*doc, *node))
        .collect();
    for node in &hidden {
        doc.set_attribute(*node, REMOVED_CONTENT_ATTRIBUTE_NAME, "")?;
    }
    tracing::debug!(count = hidden.len(), "Marked hidden elements");
    Ok(hidden.len())
}

/// Hidden, `display: none`, or invisible with no layout footprint.
///
/// Invisible elements that still occupy space are kept: they are often
/// placeholders the page relies on.
pub fn is_visually_absent<D: DocumentHandle + ?Sized>(doc: &D, node: NodeId) -> bool {
    if doc.is_hidden(node) {
        return true;
    }
    let style = doc.computed_style(node);
    if style.is_display_none() {
        return true;
    }
    let invisible = style.opacity == 0.0 || style.visibility == Visibility::Hidden;
    invisible && doc.client_size(node).is_empty()
}

/// Strip `marker` from every element carrying it. Returns the number of
/// elements unmarked; zero matches is not an error.
pub fn unmark<D: DocumentHandle + ?Sized>(doc: &mut D, marker: Marker) -> Result<usize, DocumentError> {
    let name = marker.attribute_name();
    let marked = doc.elements_with_attribute(name);
    for node in &marked {
        doc.remove_attribute(*node, name)?;
    }
    Ok(marked.len())
}

pub fn count_marked<D: DocumentHandle + ?Sized>(doc: &D, marker: Marker) -> usize {
    doc.elements_with_attribute(marker.attribute_name()).len()
}
