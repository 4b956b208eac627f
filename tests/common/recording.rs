//! Recording test doubles

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pagesnap::artifact::{Artifact, ArtifactError, ArtifactSink};
use pagesnap::capture::CaptureUi;
use pagesnap::messaging::{Controller, OutboundMessage};
use parking_lot::Mutex;

/// Controller keeping every message it receives.
#[derive(Default)]
pub struct RecordingController {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl RecordingController {
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().clone()
    }

    pub fn progress_indices(&self) -> Vec<u64> {
        self.messages
            .lock()
            .iter()
            .filter_map(|message| match message {
                OutboundMessage::ProcessProgress { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&OutboundMessage) -> bool) -> usize {
        self.messages.lock().iter().filter(|m| predicate(*m)).count()
    }
}

impl Controller for RecordingController {
    fn send(&self, message: OutboundMessage) {
        self.messages.lock().push(message);
    }
}

/// Sink keeping artifacts in memory.
#[derive(Default)]
pub struct RecordingSink {
    artifacts: Mutex<Vec<Artifact>>,
}

impl RecordingSink {
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.lock().clone()
    }

    /// Content of the only saved artifact.
    pub fn single_content(&self) -> String {
        let artifacts = self.artifacts.lock();
        assert_eq!(artifacts.len(), 1, "expected exactly one artifact");
        String::from_utf8(artifacts[0].blob.bytes.clone()).expect("artifact is UTF-8")
    }
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn save(&self, artifact: &Artifact) -> Result<(), ArtifactError> {
        self.artifacts.lock().push(artifact.clone());
        Ok(())
    }
}

/// UI counting its hook invocations.
#[derive(Default)]
pub struct CountingUi {
    pub inits: AtomicUsize,
    pub ends: AtomicUsize,
}

impl CountingUi {
    pub fn counts(&self) -> (usize, usize) {
        (self.inits.load(Ordering::SeqCst), self.ends.load(Ordering::SeqCst))
    }
}

impl CaptureUi for CountingUi {
    fn init(&self) {
        self.inits.fetch_add(1, Ordering::SeqCst);
    }

    fn end(&self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }
}
