//! Canvas pixel export.

use crate::capture::CanvasSnapshot;
use crate::dom::{DocumentHandle, NodeId};

const CANVAS_MIME_TYPE: &str = "image/png";

/// Export every canvas in document order.
///
/// The result has one entry per canvas so the engine can correlate entries
/// with elements by index. A canvas that cannot be exported (tainted by
/// cross-origin content, encoding failure) yields `None` at its position.
pub fn snapshot_canvases<D: DocumentHandle + ?Sized>(doc: &D) -> Vec<Option<CanvasSnapshot>> {
    doc.elements_by_tag("canvas")
        .into_iter()
        .enumerate()
        .map(|(index, canvas)| snapshot_canvas(doc, index, canvas))
        .collect()
}

fn snapshot_canvas<D: DocumentHandle + ?Sized>(
    doc: &D,
    index: usize,
    canvas: NodeId,
) -> Option<CanvasSnapshot> {
    match doc.canvas_to_data_uri(canvas, CANVAS_MIME_TYPE) {
        Ok(data_uri) => {
            let size = doc.client_size(canvas);
            Some(CanvasSnapshot {
                data_uri,
                width: size.width,
                height: size.height,
            })
        }
        Err(e) => {
            tracing::warn!(index, error = %e, "Canvas export failed, recording empty entry");
            None
        }
    }
}
