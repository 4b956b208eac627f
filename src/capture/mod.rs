//! Single-flight page capture.
//!
//! [`CaptureOrchestrator`] sequences the pipeline: normalize the document,
//! collect canvas and frame data, mark and serialize the document, strip the
//! markers again, run the engine and hand the packaged page to the sink.

pub mod annotate;
pub mod canvas;
mod error;
pub mod normalize;
mod options;
mod orchestrator;
pub mod progress;
pub mod session;
mod ui;

pub use annotate::Marker;
pub use error::CaptureError;
pub use options::{CanvasSnapshot, CaptureOptions};
pub use orchestrator::{CaptureOrchestrator, CaptureOutcome, CaptureTask, Dispatch};
pub use progress::{ProgressReporter, ProgressState};
pub use session::{CaptureSession, CaptureSlot, SessionState};
pub use ui::{CaptureUi, LogUi};
