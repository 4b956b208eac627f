//! Single-flight guard for captures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

/// Process-wide capture state: at most one capture runs at a time.
#[derive(Debug, Default)]
pub struct CaptureSession {
    running: AtomicBool,
}

impl CaptureSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> SessionState {
        if self.running.load(Ordering::Acquire) {
            SessionState::Running
        } else {
            SessionState::Idle
        }
    }

    /// Atomically move from idle to running.
    ///
    /// Returns `None` when a capture is already in flight. The returned slot
    /// puts the session back to idle when dropped.
    pub fn try_begin(self: &Arc<Self>) -> Option<CaptureSlot> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CaptureSlot {
                session: Arc::clone(self),
            })
    }
}

/// Proof that the holder owns the running capture.
#[derive(Debug)]
pub struct CaptureSlot {
    session: Arc<CaptureSession>,
}

impl Drop for CaptureSlot {
    fn drop(&mut self) {
        self.session.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_rejected() {
        let session = CaptureSession::new();
        let slot = session.try_begin();
        assert!(slot.is_some());
        assert_eq!(session.state(), SessionState::Running);
        assert!(session.try_begin().is_none());

        drop(slot);

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.try_begin().is_some());
    }

    #[test]
    fn test_slot_released_on_panic() {
        let session = CaptureSession::new();
        let cloned = Arc::clone(&session);
        let result = std::thread::spawn(move || {
            let _slot = cloned.try_begin().unwrap();
            panic!("capture blew up");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }
}
