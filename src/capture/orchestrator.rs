//! Capture pipeline.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::annotate::{self, Marker};
use super::canvas::snapshot_canvases;
use super::normalize::{hide_head_frames, normalize_document};
use super::progress::ProgressReporter;
use super::session::{CaptureSession, CaptureSlot, SessionState};
use super::ui::CaptureUi;
use super::{CaptureError, CaptureOptions};
use crate::artifact::{self, ArtifactSink, Clock, SystemClock};
use crate::dom::{doctype_string, DocumentError, DocumentHandle, SharedDocument};
use crate::engine::{CaptureEngine, FrameTreeProvider, ProgressHandle, StaticFrameTree};
use crate::messaging::{Acknowledgement, Controller, InboundMessage, OutboundMessage};

/// Terminal state of a capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The artifact was handed to the sink
    Completed { filename: String },
    /// Another capture was in flight; nothing happened
    Busy,
}

pub type CaptureTask = JoinHandle<Result<CaptureOutcome, CaptureError>>;

/// Response to an inbound message.
#[derive(Debug)]
pub struct Dispatch {
    pub ack: Acknowledgement,
    /// The spawned pipeline, when the message started one
    pub task: Option<CaptureTask>,
}

/// Owns the single-flight guard and runs the capture pipeline against one
/// document.
pub struct CaptureOrchestrator<D: DocumentHandle> {
    document: SharedDocument<D>,
    engine: Arc<dyn CaptureEngine>,
    frames: Arc<dyn FrameTreeProvider>,
    controller: Arc<dyn Controller>,
    sink: Arc<dyn ArtifactSink>,
    ui: Option<Arc<dyn CaptureUi>>,
    clock: Arc<dyn Clock>,
    session: Arc<CaptureSession>,
}

impl<D: DocumentHandle + 'static> CaptureOrchestrator<D> {
    pub fn new(
        document: SharedDocument<D>,
        engine: Arc<dyn CaptureEngine>,
        controller: Arc<dyn Controller>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            document,
            engine,
            frames: Arc::new(StaticFrameTree::default()),
            controller,
            sink,
            ui: None,
            clock: Arc::new(SystemClock),
            session: CaptureSession::new(),
        }
    }

    pub fn with_frames(mut self, frames: Arc<dyn FrameTreeProvider>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_ui(mut self, ui: Arc<dyn CaptureUi>) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn document(&self) -> &SharedDocument<D> {
        &self.document
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Message entry point. Always acknowledges; starts a capture on the
    /// tokio runtime when the message is a start request and no capture is
    /// in flight.
    pub fn handle_message(self: &Arc<Self>, message: InboundMessage) -> Dispatch {
        let task = match message {
            InboundMessage::ProcessStart { options } => match self.session.try_begin() {
                Some(slot) => {
                    let orchestrator = Arc::clone(self);
                    Some(tokio::spawn(async move {
                        orchestrator.run(slot, options).await
                    }))
                }
                None => {
                    tracing::warn!("Capture already in progress, ignoring start request");
                    None
                }
            },
            InboundMessage::Unknown => {
                tracing::debug!("Ignoring unknown message");
                None
            }
        };
        Dispatch {
            ack: Acknowledgement::default(),
            task,
        }
    }

    /// Run a capture and wait for its outcome.
    pub async fn capture(
        self: &Arc<Self>,
        options: CaptureOptions,
    ) -> Result<CaptureOutcome, CaptureError> {
        match self.session.try_begin() {
            Some(slot) => self.run(slot, options).await,
            None => {
                tracing::warn!("Capture already in progress, ignoring start request");
                Ok(CaptureOutcome::Busy)
            }
        }
    }

    /// Holds `slot` until the pipeline ends, so the guard is cleared after
    /// the terminal message whatever the outcome. The pipeline runs in its
    /// own task: a panic in a collaborator is reported like any other failure.
    async fn run(
        self: &Arc<Self>,
        slot: CaptureSlot,
        options: CaptureOptions,
    ) -> Result<CaptureOutcome, CaptureError> {
        let orchestrator = Arc::clone(self);
        let result = tokio::spawn(async move { orchestrator.pipeline(options).await })
            .await
            .unwrap_or_else(|e| Err(CaptureError::Task(e.to_string())));
        if let Err(e) = &result {
            tracing::error!(error = %e, "Capture failed");
            self.controller.send(OutboundMessage::ProcessError {
                error: e.to_string(),
            });
        }
        drop(slot);
        result.map(|filename| CaptureOutcome::Completed { filename })
    }

    async fn pipeline(&self, mut options: CaptureOptions) -> Result<String, CaptureError> {
        {
            let mut doc = self.document.lock();
            let report = normalize_document(&mut *doc)?;
            tracing::debug!(
                fenced_scripts = report.fenced_scripts,
                relocated_noscripts = report.relocated_noscripts,
                "Document normalized"
            );
        }

        self.enrich(&mut options).await?;

        self.snapshot(&mut options)?;

        let shadow_enabled = options.shadow_enabled;
        let append_save_date = options.append_save_date;

        let producer = self.engine.initialize(options).await?;
        let ui = self.ui.as_ref().filter(|_| shadow_enabled);
        if let Some(ui) = ui {
            ui.init();
        }
        let mut page = producer.produce().await?;
        tracing::debug!(title = %page.title, bytes = page.content.len(), "Page produced");

        let artifact = artifact::package(&mut page, append_save_date, self.clock.as_ref());
        self.sink.save(&artifact).await?;
        if let Some(ui) = ui {
            ui.end();
        }
        tracing::info!(filename = %artifact.filename, "Capture completed");
        Ok(artifact.filename)
    }

    /// Attach the side-channel data the engine needs.
    async fn enrich(&self, options: &mut CaptureOptions) -> Result<(), CaptureError> {
        let canvas_data = snapshot_canvases(&*self.document.lock());
        tracing::debug!(canvases = canvas_data.len(), "Canvas data collected");
        options.canvas_data = Some(canvas_data);
        if !options.remove_frames {
            let frames = self.frames.frames_data().await?;
            tracing::debug!(frames = frames.len(), "Frame data collected");
            options.frames_data = Some(frames);
        }
        options.js_enabled = true;
        let reporter = ProgressReporter::new(Arc::clone(&self.controller));
        options.on_progress = Some(ProgressHandle::new(Arc::new(reporter)));
        Ok(())
    }

    /// Mark, serialize, then strip the markers again. Markers are stripped
    /// even when marking or serialization failed.
    fn snapshot(&self, options: &mut CaptureOptions) -> Result<(), CaptureError> {
        let mut doc = self.document.lock();
        let marked = mark_and_serialize(&mut *doc, options);
        let restored = restore_markers(&mut *doc, options);
        let (url, content) = marked?;
        restored?;
        options.url = Some(url);
        options.content = Some(content);
        Ok(())
    }
}

fn mark_and_serialize<D: DocumentHandle + ?Sized>(
    doc: &mut D,
    options: &CaptureOptions,
) -> Result<(String, String), CaptureError> {
    if options.selected {
        annotate::mark_selected_content(doc)?;
    }
    if !options.remove_frames {
        let hidden = hide_head_frames(doc)?;
        tracing::debug!(hidden, "Head frames hidden");
    }
    if options.remove_hidden_elements {
        annotate::mark_hidden_elements(doc)?;
    }
    let content = match doc.document_element() {
        Some(root) => doctype_string(doc.doctype()) + &doc.outer_html(root),
        None => doctype_string(doc.doctype()),
    };
    Ok((doc.location(), content))
}

fn restore_markers<D: DocumentHandle + ?Sized>(
    doc: &mut D,
    options: &CaptureOptions,
) -> Result<(), DocumentError> {
    if options.remove_hidden_elements {
        annotate::unmark(doc, Marker::RemovedContent)?;
    }
    if options.selected {
        annotate::unmark(doc, Marker::SelectedContent)?;
    }
    Ok(())
}
