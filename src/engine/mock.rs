//! Mock capture engine for deterministic testing
//!
//! Implements [`CaptureEngine`] without doing any real capture work: it
//! records the options it was initialized with, replays pre-configured
//! lifecycle events into the installed observer and returns a canned page.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::{CaptureEngine, EngineError, EngineEvent, Page, PageProducer, ProgressHandle};
use crate::capture::CaptureOptions;

/// Configuration for mock engine behavior
#[derive(Clone, Default)]
pub struct MockConfig {
    /// Events to emit while producing the page
    pub events: Vec<EngineEvent>,
    /// Title of the produced page
    pub title: Option<String>,
    /// Error returned by `initialize`
    pub initialize_error: Option<EngineError>,
    /// Error returned by `produce`, after the events were emitted
    pub produce_error: Option<EngineError>,
    /// When set, `produce` waits for a notification before doing anything
    pub gate: Option<Arc<Notify>>,
    /// `produce` panics instead of returning
    pub panic_on_produce: bool,
}

impl MockConfig {
    pub fn with_events(mut self, events: Vec<EngineEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Configure `initialize` to fail
    pub fn failing_initialize(mut self) -> Self {
        self.initialize_error = Some(EngineError::Initialization("mock-failure".into()));
        self
    }

    /// Configure `produce` to fail
    pub fn failing_produce(mut self) -> Self {
        self.produce_error = Some(EngineError::Production("mock-failure".into()));
        self
    }

    /// Configure `produce` to panic
    pub fn panicking_produce(mut self) -> Self {
        self.panic_on_produce = true;
        self
    }

    /// Block `produce` until `gate` is notified
    pub fn blocking_on(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

/// Mock engine for testing
///
/// The produced page echoes the snapshot content from the options, so tests
/// can inspect exactly what the orchestrator serialized.
#[derive(Default)]
pub struct MockCaptureEngine {
    config: MockConfig,
    /// Options received by `initialize`
    captured_options: Arc<Mutex<Vec<CaptureOptions>>>,
    produce_calls: Arc<AtomicUsize>,
}

impl MockCaptureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.config = config;
        self
    }

    pub fn captured_options(&self) -> Vec<CaptureOptions> {
        self.captured_options.lock().clone()
    }

    pub fn initialize_calls(&self) -> usize {
        self.captured_options.lock().len()
    }

    pub fn produce_calls(&self) -> usize {
        self.produce_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureEngine for MockCaptureEngine {
    async fn initialize(&self, options: CaptureOptions) -> Result<Box<dyn PageProducer>, EngineError> {
        self.captured_options.lock().push(options.clone());
        if let Some(error) = &self.config.initialize_error {
            return Err(error.clone());
        }
        let title = self
            .config
            .title
            .clone()
            .or_else(|| options.url.clone())
            .unwrap_or_default();
        Ok(Box::new(MockProducer {
            config: self.config.clone(),
            title,
            content: options.content.unwrap_or_default(),
            observer: options.on_progress,
            produce_calls: Arc::clone(&self.produce_calls),
        }))
    }
}

struct MockProducer {
    config: MockConfig,
    title: String,
    content: String,
    observer: Option<ProgressHandle>,
    produce_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PageProducer for MockProducer {
    async fn produce(self: Box<Self>) -> Result<Page, EngineError> {
        self.produce_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.config.gate {
            gate.notified().await;
        }
        if self.config.panic_on_produce {
            panic!("mock engine panicked");
        }
        if let Some(observer) = &self.observer {
            for event in &self.config.events {
                observer.notify(event.clone());
            }
        }
        if let Some(error) = self.config.produce_error {
            return Err(error);
        }
        Ok(Page::new(self.title, self.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_echoes_content() {
        let engine = MockCaptureEngine::new().with_config(MockConfig::default().with_title("Mock"));
        let options = CaptureOptions {
            content: Some("<html></html>".to_string()),
            ..Default::default()
        };

        let page = engine.initialize(options).await.unwrap().produce().await.unwrap();

        assert_eq!(page.title, "Mock");
        assert_eq!(page.content, "<html></html>");
        assert_eq!(engine.initialize_calls(), 1);
        assert_eq!(engine.produce_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let engine = MockCaptureEngine::new().with_config(MockConfig::default().failing_initialize());
        assert!(engine.initialize(CaptureOptions::default()).await.is_err());

        let engine = MockCaptureEngine::new().with_config(MockConfig::default().failing_produce());
        let producer = engine.initialize(CaptureOptions::default()).await.unwrap();
        assert_eq!(
            producer.produce().await,
            Err(EngineError::Production("mock-failure".into()))
        );
    }
}
