//! Aggregation of engine lifecycle events into controller progress messages.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{EngineEvent, ProgressObserver, ResourceProgress};
use crate::messaging::{Controller, OutboundMessage};

/// Weight of a loaded resource relative to a resource that started loading.
pub const PROGRESS_LOADED_COEFFICIENT: u64 = 2;

/// Counters for one capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub index_loaded: u64,
    pub index_loading: u64,
    pub max: u64,
}

impl ProgressState {
    /// `index_loaded * 2 + index_loading`, saturating at `u64::MAX`
    pub fn index(&self) -> u64 {
        self.index_loaded
            .saturating_mul(PROGRESS_LOADED_COEFFICIENT)
            .saturating_add(self.index_loading)
    }

    /// `max * 3`, the same scale as [`ProgressState::index`]
    pub fn max_index(&self) -> u64 {
        self.max.saturating_mul(PROGRESS_LOADED_COEFFICIENT + 1)
    }

    /// Fold an event into the counters and return the message it produces, if any.
    ///
    /// Counters never decrease, even if the engine reports indices out of order.
    pub fn apply(&mut self, event: &EngineEvent) -> Option<OutboundMessage> {
        match event {
            EngineEvent::ResourcesInitialized(progress) => Some(self.progress(progress)),
            EngineEvent::ResourceLoading(progress) => {
                self.index_loading = self.index_loading.max(progress.index);
                Some(self.progress(progress))
            }
            EngineEvent::ResourceLoaded(progress) => {
                self.index_loaded = self.index_loaded.max(progress.index);
                Some(self.progress(progress))
            }
            EngineEvent::PageEnded => Some(OutboundMessage::ProcessEnd),
            _ => None,
        }
    }

    fn progress(&mut self, progress: &ResourceProgress) -> OutboundMessage {
        self.max = progress.max;
        OutboundMessage::ProcessProgress {
            index: self.index(),
            max_index: self.max_index(),
        }
    }
}

/// Observer installed in the capture options; forwards progress to the controller.
pub struct ProgressReporter {
    state: Mutex<ProgressState>,
    controller: Arc<dyn Controller>,
}

impl ProgressReporter {
    pub fn new(controller: Arc<dyn Controller>) -> Self {
        Self {
            state: Mutex::new(ProgressState::default()),
            controller,
        }
    }

    pub fn state(&self) -> ProgressState {
        *self.state.lock()
    }
}

impl ProgressObserver for ProgressReporter {
    fn on_event(&self, event: EngineEvent) {
        // Send under the lock so messages keep the order of the events.
        let mut state = self.state.lock();
        if let Some(message) = state.apply(&event) {
            tracing::trace!(event = event.event_type_name(), ?message, "Progress");
            self.controller.send(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::ChannelController;
    use proptest::prelude::*;

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<OutboundMessage>) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            out.push(message);
        }
        out
    }

    #[test]
    fn test_huge_indices_saturate() {
        let mut state = ProgressState::default();
        let huge = u64::MAX / 2 + 1;

        let first = state.apply(&EngineEvent::ResourceLoaded(ResourceProgress::new(huge, huge - 1)));
        let second = state.apply(&EngineEvent::ResourceLoading(ResourceProgress::new(huge, huge - 1)));

        assert_eq!(
            first,
            Some(OutboundMessage::ProcessProgress {
                index: u64::MAX,
                max_index: u64::MAX
            })
        );
        assert_eq!(
            second,
            Some(OutboundMessage::ProcessProgress {
                index: u64::MAX,
                max_index: u64::MAX
            })
        );
    }

    #[test]
    fn test_weighted_progress() {
        let (controller, mut rx) = ChannelController::channel();
        let reporter = ProgressReporter::new(Arc::new(controller));

        reporter.on_event(EngineEvent::ResourcesInitialized(ResourceProgress::new(0, 4)));
        reporter.on_event(EngineEvent::ResourceLoading(ResourceProgress::new(1, 4)));
        reporter.on_event(EngineEvent::ResourceLoading(ResourceProgress::new(2, 4)));
        reporter.on_event(EngineEvent::ResourceLoaded(ResourceProgress::new(1, 4)));
        reporter.on_event(EngineEvent::StageStarted { step: 1 });
        reporter.on_event(EngineEvent::PageEnded);

        assert_eq!(
            drain(&mut rx),
            vec![
                OutboundMessage::ProcessProgress {
                    index: 0,
                    max_index: 12
                },
                OutboundMessage::ProcessProgress {
                    index: 1,
                    max_index: 12
                },
                OutboundMessage::ProcessProgress {
                    index: 2,
                    max_index: 12
                },
                OutboundMessage::ProcessProgress {
                    index: 4,
                    max_index: 12
                },
                OutboundMessage::ProcessEnd,
            ]
        );
        assert_eq!(
            reporter.state(),
            ProgressState {
                index_loaded: 1,
                index_loading: 2,
                max: 4
            }
        );
    }

    #[test]
    fn test_counters_never_decrease() {
        let mut state = ProgressState::default();
        state.apply(&EngineEvent::ResourceLoaded(ResourceProgress::new(3, 5)));
        state.apply(&EngineEvent::ResourceLoaded(ResourceProgress::new(1, 5)));
        assert_eq!(state.index_loaded, 3);
        assert_eq!(state.index(), 6);
    }

    #[test]
    fn test_page_ended_has_no_payload() {
        let mut state = ProgressState::default();
        assert_eq!(
            state.apply(&EngineEvent::PageEnded),
            Some(OutboundMessage::ProcessEnd)
        );
        assert_eq!(state.apply(&EngineEvent::PageLoaded), None);
    }

    proptest! {
        #[test]
        fn prop_emitted_index_is_monotonic(
            steps in proptest::collection::vec((any::<bool>(), 0u64..4), 1..64),
            max in 1u64..500,
        ) {
            let mut state = ProgressState::default();
            let mut loaded = 0u64;
            let mut loading = 0u64;
            let mut last = 0u64;
            for (is_loaded, increment) in steps {
                let event = if is_loaded {
                    loaded += increment;
                    EngineEvent::ResourceLoaded(ResourceProgress::new(loaded, max))
                } else {
                    loading += increment;
                    EngineEvent::ResourceLoading(ResourceProgress::new(loading, max))
                };
                match state.apply(&event) {
                    Some(OutboundMessage::ProcessProgress { index, max_index }) => {
                        prop_assert!(index >= last);
                        prop_assert_eq!(max_index, max * 3);
                        last = index;
                    }
                    other => prop_assert!(false, "unexpected message {:?}", other),
                }
            }
        }
    }
}
