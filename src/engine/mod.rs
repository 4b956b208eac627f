//! Capture engine seam.
//!
//! The engine turns the enriched [`CaptureOptions`] (document markup plus
//! side-channel canvas and frame data) into the final [`Page`]. It is
//! consumed through two steps: [`CaptureEngine::initialize`] yields a
//! [`PageProducer`], and producing the page runs the actual work. Lifecycle
//! events are pushed into the [`ProgressObserver`] installed in the options.

pub mod frames;
pub mod markup;
pub mod mock;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CaptureOptions;

pub use frames::{
    FrameData, FrameTreeError, FrameTreeProvider, FramesData, SrcdocFrameTree, StaticFrameTree,
};
pub use markup::MarkupEngine;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine initialization failed: {0}")]
    Initialization(String),
    #[error("Page production failed: {0}")]
    Production(String),
    #[error("Invalid capture options: {0}")]
    InvalidOptions(String),
}

/// Position of a resource in the engine's resource list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProgress {
    pub index: u64,
    pub max: u64,
}

impl ResourceProgress {
    pub fn new(index: u64, max: u64) -> Self {
        Self { index, max }
    }
}

/// Lifecycle events emitted by a capture engine while it works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EngineEvent {
    PageLoading,
    PageLoaded,
    /// Resource list is known
    ResourcesInitialized(ResourceProgress),
    ResourceLoading(ResourceProgress),
    ResourceLoaded(ResourceProgress),
    StageStarted { step: u32 },
    StageEnded { step: u32 },
    /// The engine finished its own work on the page
    PageEnded,
}

impl EngineEvent {
    pub fn event_type_name(&self) -> &'static str {
        match self {
            EngineEvent::PageLoading => "PageLoading",
            EngineEvent::PageLoaded => "PageLoaded",
            EngineEvent::ResourcesInitialized(_) => "ResourcesInitialized",
            EngineEvent::ResourceLoading(_) => "ResourceLoading",
            EngineEvent::ResourceLoaded(_) => "ResourceLoaded",
            EngineEvent::StageStarted { .. } => "StageStarted",
            EngineEvent::StageEnded { .. } => "StageEnded",
            EngineEvent::PageEnded => "PageEnded",
        }
    }
}

/// Receiver of engine lifecycle events. Must not block the engine.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: EngineEvent);
}

/// Cloneable handle to the observer installed in [`CaptureOptions::on_progress`].
#[derive(Clone)]
pub struct ProgressHandle(Arc<dyn ProgressObserver>);

impl ProgressHandle {
    pub fn new(observer: Arc<dyn ProgressObserver>) -> Self {
        Self(observer)
    }

    pub fn notify(&self, event: EngineEvent) {
        self.0.on_event(event);
    }
}

impl fmt::Debug for ProgressHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressHandle(..)")
    }
}

/// Result of a capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub content: String,
    /// Set by the artifact packager
    pub filename: Option<String>,
    /// Transient object URL, set by the artifact packager
    pub url: Option<String>,
}

impl Page {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            filename: None,
            url: None,
        }
    }
}

/// Zero-argument producer returned by [`CaptureEngine::initialize`].
#[async_trait]
pub trait PageProducer: Send {
    async fn produce(self: Box<Self>) -> Result<Page, EngineError>;
}

#[async_trait]
pub trait CaptureEngine: Send + Sync {
    /// Prepare a capture from fully enriched options.
    async fn initialize(&self, options: CaptureOptions) -> Result<Box<dyn PageProducer>, EngineError>;
}
