pub mod artifact;
pub mod capture;
pub mod cli;
pub mod config;
pub mod dom;
pub mod engine;
pub mod messaging;
pub mod util;

pub use artifact::{Artifact, ArtifactError, ArtifactSink, Clock};
pub use capture::{
    CaptureError, CaptureOptions, CaptureOrchestrator, CaptureOutcome,
    CaptureSession, Dispatch,
};
pub use config::Config;
pub use dom::{DocumentError, DocumentHandle, MemoryDocument, SharedDocument};
pub use engine::{CaptureEngine, EngineError, EngineEvent, MarkupEngine, Page, PageProducer};
pub use messaging::{Controller, InboundMessage, OutboundMessage};
