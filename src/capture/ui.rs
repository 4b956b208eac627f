//! In-page capture UI hooks.

/// Hooks run around the engine when `shadowEnabled` is set. Return values are
/// not consumed.
pub trait CaptureUi: Send + Sync {
    fn init(&self);
    fn end(&self);
}

/// Reports the capture lifecycle through the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogUi;

impl CaptureUi for LogUi {
    fn init(&self) {
        tracing::info!("Capture started");
    }

    fn end(&self) {
        tracing::info!("Capture finished");
    }
}
