//! Integration tests for the capture pipeline
//!
//! Runs the orchestrator with the markup engine and the srcdoc frame
//! provider against the article fixture.

use std::sync::Arc;

use super::common::fixtures::{article_document, fixed_clock};
use super::common::recording::{CountingUi, RecordingController, RecordingSink};
use pagesnap::capture::annotate::{self, Marker};
use pagesnap::capture::{CaptureOptions, CaptureOrchestrator, CaptureOutcome, SessionState};
use pagesnap::dom::{shared, DocumentHandle, MemoryDocument};
use pagesnap::engine::mock::{MockCaptureEngine, MockConfig};
use pagesnap::engine::{CaptureEngine, MarkupEngine, SrcdocFrameTree};
use pagesnap::messaging::{Acknowledgement, InboundMessage, OutboundMessage};

struct Setup {
    orchestrator: Arc<CaptureOrchestrator<MemoryDocument>>,
    controller: Arc<RecordingController>,
    sink: Arc<RecordingSink>,
}

fn setup_with(engine: Arc<dyn CaptureEngine>, ui: Option<Arc<CountingUi>>) -> Setup {
    let document = shared(article_document());
    let controller = Arc::new(RecordingController::default());
    let sink = Arc::new(RecordingSink::default());
    let mut orchestrator = CaptureOrchestrator::new(
        document.clone(),
        engine,
        controller.clone(),
        sink.clone(),
    )
    .with_frames(Arc::new(SrcdocFrameTree::new(document)))
    .with_clock(Arc::new(fixed_clock()));
    if let Some(ui) = ui {
        orchestrator = orchestrator.with_ui(ui);
    }
    Setup {
        orchestrator: Arc::new(orchestrator),
        controller,
        sink,
    }
}

fn setup() -> Setup {
    setup_with(Arc::new(MarkupEngine::new()), None)
}

fn live_marker_count(setup: &Setup) -> usize {
    let doc = setup.orchestrator.document().lock();
    annotate::count_marked(&*doc, Marker::SelectedContent)
        + annotate::count_marked(&*doc, Marker::RemovedContent)
}

fn assert_no_markers(content: &str) {
    assert!(!content.contains(annotate::SELECTED_CONTENT_ATTRIBUTE_NAME));
    assert!(!content.contains(annotate::REMOVED_CONTENT_ATTRIBUTE_NAME));
}

/// Selection-only capture keeps just the selected paragraph
#[tokio::test]
async fn test_selected_capture() {
    let setup = setup();

    let outcome = setup
        .orchestrator
        .capture(CaptureOptions::default().with_selected(true).with_remove_hidden_elements(true))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CaptureOutcome::Completed {
            filename: "Example.html".to_string()
        }
    );
    let content = setup.sink.single_content();
    assert!(content.starts_with("<!DOCTYPE html>\n"));
    assert!(content.contains("<p id=\"lead\">Lead paragraph with the selected words.</p>"));
    assert!(!content.contains("Site menu"));
    assert!(!content.contains("Headline"));
    assert_no_markers(&content);
    assert_eq!(live_marker_count(&setup), 0);
}

/// Hidden elements are dropped, canvases and frames inlined
#[tokio::test]
async fn test_full_capture_inlines_resources() {
    let setup = setup();

    setup
        .orchestrator
        .capture(CaptureOptions::default().with_remove_hidden_elements(true))
        .await
        .unwrap();

    let content = setup.sink.single_content();
    assert!(content.contains("Site menu"));
    assert!(!content.contains("Advert"));
    assert!(content.contains("<img id=\"chart\" src=\"data:image/png;base64,"));
    assert!(!content.contains("<canvas"));
    assert!(content.contains(
        "srcdoc=\"<html><head></head><body><p>Embedded</p></body></html>\""
    ));
    assert_no_markers(&content);

    // One canvas and one frame: 2 resources on a 3-unit scale
    assert_eq!(setup.controller.progress_indices(), vec![0, 1, 3, 4, 6]);
    assert!(setup.controller.messages().iter().all(|message| match message {
        OutboundMessage::ProcessProgress { max_index, .. } => *max_index == 6,
        _ => true,
    }));
    assert_eq!(
        setup
            .controller
            .count(|message| *message == OutboundMessage::ProcessEnd),
        1
    );
    assert_eq!(
        setup.controller.messages().last(),
        Some(&OutboundMessage::ProcessEnd)
    );
}

/// Frame removal skips frame harvesting entirely
#[tokio::test]
async fn test_remove_frames_skips_frame_data() {
    let setup = setup();

    setup
        .orchestrator
        .capture(CaptureOptions::default().with_remove_frames(true))
        .await
        .unwrap();

    let content = setup.sink.single_content();
    assert!(content.contains("srcdoc=\"<p>Embedded</p>\""));
    assert_eq!(setup.controller.progress_indices(), vec![0, 1, 3]);
}

/// Normalization is not reverted after the capture
#[tokio::test]
async fn test_head_noscript_stays_relocated() {
    let setup = setup();

    setup
        .orchestrator
        .capture(CaptureOptions::default())
        .await
        .unwrap();

    let doc = setup.orchestrator.document().lock();
    let body = doc.body().unwrap();
    let first = doc.first_child(body).unwrap();
    assert_eq!(doc.tag_name(first), Some("noscript"));
    assert!(doc.elements_by_tag("noscript").iter().all(|node| {
        doc.parent(*node) == Some(body)
    }));
}

/// A failing engine leaves no markers and reports exactly one error
#[tokio::test]
async fn test_engine_failure_restores_document() {
    let engine = Arc::new(MockCaptureEngine::new().with_config(MockConfig::default().failing_produce()));
    let ui = Arc::new(CountingUi::default());
    let setup = setup_with(engine, Some(ui.clone()));
    let orchestrator = &setup.orchestrator;

    let dispatch = orchestrator.handle_message(InboundMessage::ProcessStart {
        options: CaptureOptions::default()
            .with_selected(true)
            .with_remove_hidden_elements(true)
            .with_shadow_enabled(true),
    });
    let result = dispatch.task.unwrap().await.unwrap();

    assert!(result.is_err());
    let doc = orchestrator.document().lock();
    assert_eq!(annotate::count_marked(&*doc, Marker::SelectedContent), 0);
    assert_eq!(annotate::count_marked(&*doc, Marker::RemovedContent), 0);
    drop(doc);
    assert_eq!(
        setup.controller.messages(),
        vec![OutboundMessage::ProcessError {
            error: "Page production failed: mock-failure".to_string()
        }]
    );
    assert!(setup.sink.artifacts().is_empty());
    // The UI was started but never ended
    assert_eq!(ui.counts(), (1, 0));
    assert_eq!(orchestrator.state(), SessionState::Idle);
}

/// A burst of start requests runs exactly one capture
#[tokio::test]
async fn test_burst_of_start_requests() {
    let setup = setup();
    let start = InboundMessage::ProcessStart {
        options: CaptureOptions::default(),
    };

    let dispatches: Vec<_> = (0..8)
        .map(|_| setup.orchestrator.handle_message(start.clone()))
        .collect();
    assert!(dispatches
        .iter()
        .all(|dispatch| dispatch.ack == Acknowledgement::default()));
    let tasks: Vec<_> = dispatches.into_iter().filter_map(|d| d.task).collect();
    assert_eq!(tasks.len(), 1);

    let results = futures::future::join_all(tasks).await;
    assert!(results.into_iter().all(|r| matches!(r, Ok(Ok(_)))));
    assert_eq!(setup.sink.artifacts().len(), 1);
    assert_eq!(
        setup
            .controller
            .count(|message| *message == OutboundMessage::ProcessEnd),
        1
    );

    // Idle again afterwards
    let next = setup.orchestrator.handle_message(start);
    next.task.unwrap().await.unwrap().unwrap();
    assert_eq!(setup.sink.artifacts().len(), 2);
}

/// Shadow UI hooks wrap the engine only when enabled
#[tokio::test]
async fn test_shadow_ui_hooks() {
    let ui = Arc::new(CountingUi::default());
    let setup = setup_with(Arc::new(MarkupEngine::new()), Some(ui.clone()));
    let orchestrator = &setup.orchestrator;

    orchestrator.capture(CaptureOptions::default()).await.unwrap();
    assert_eq!(ui.counts(), (0, 0));

    orchestrator
        .capture(CaptureOptions::default().with_shadow_enabled(true))
        .await
        .unwrap();
    assert_eq!(ui.counts(), (1, 1));
}

/// The controller's JSON start message drives a capture
#[tokio::test]
async fn test_controller_json_message() {
    let setup = setup();
    let message: InboundMessage = serde_json::from_str(
        r#"{"type":"processStart","options":{"removeHiddenElements":true,"appendSaveDate":true}}"#,
    )
    .unwrap();

    let dispatch = setup.orchestrator.handle_message(message);

    assert_eq!(serde_json::to_string(&dispatch.ack).unwrap(), "{}");
    let outcome = dispatch.task.unwrap().await.unwrap().unwrap();
    assert_eq!(
        outcome,
        CaptureOutcome::Completed {
            filename: "Example (2024-03-05 14:07:09).html".to_string()
        }
    );
    let artifact = &setup.sink.artifacts()[0];
    assert_eq!(artifact.blob.mime, "text/html");
    assert!(artifact.blob.url.starts_with("blob:"));
}

/// Captures run to completion outside a multi-threaded runtime
#[test]
fn test_capture_on_current_thread_runtime() {
    let setup = setup();
    let outcome = tokio_test::block_on(setup.orchestrator.capture(CaptureOptions::default()));
    let outcome = tokio_test::assert_ok!(outcome);
    assert!(matches!(outcome, CaptureOutcome::Completed { .. }));
    assert_eq!(setup.orchestrator.state(), SessionState::Idle);
}
