// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passthrough state-changed events.

use passthrough_port::{PassthroughRuntime, RuntimeEvent, StateChangedFlags, XrHost};
use tracing::{info, warn};

use crate::{PassthroughSession, PassthroughSignal, PassthroughStateEvent};

/// State events carried by `flags`, in bit order. The reinit bit carries no
/// event; it forces a stop instead.
pub fn state_events(flags: StateChangedFlags) -> Vec<PassthroughStateEvent> {
    [
        (
            StateChangedFlags::NON_RECOVERABLE_ERROR,
            PassthroughStateEvent::NonRecoverableError,
        ),
        (
            StateChangedFlags::RECOVERABLE_ERROR,
            PassthroughStateEvent::RecoverableError,
        ),
        (
            StateChangedFlags::RESTORED_ERROR,
            PassthroughStateEvent::Restored,
        ),
    ]
    .into_iter()
    .filter(|(bit, _)| flags.contains(*bit))
    .map(|(_, event)| event)
    .collect()
}

impl<R: PassthroughRuntime, H: XrHost> PassthroughSession<R, H> {
    /// Handle one polled runtime event. Returns `true` when consumed.
    pub fn on_event_polled(&mut self, event: &RuntimeEvent) -> bool {
        if !self.is_supported() {
            return false;
        }
        let RuntimeEvent::PassthroughStateChanged(flags) = *event else {
            return false;
        };
        if flags.contains(StateChangedFlags::REINIT_REQUIRED) {
            info!("passthrough reinit required, stopping");
            self.stop_all_inner();
        }
        for event in state_events(flags) {
            match event {
                PassthroughStateEvent::NonRecoverableError => {
                    warn!("passthrough non-recoverable error");
                }
                PassthroughStateEvent::RecoverableError => warn!("passthrough recoverable error"),
                PassthroughStateEvent::Restored => info!("passthrough restored"),
            }
            self.signals.emit(PassthroughSignal::StateChanged(event));
        }
        self.flush_signals();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bits_map_to_events() {
        assert_eq!(
            state_events(StateChangedFlags::RECOVERABLE_ERROR),
            vec![PassthroughStateEvent::RecoverableError]
        );
        assert!(state_events(StateChangedFlags::REINIT_REQUIRED).is_empty());
    }

    #[test]
    fn combined_bits_are_all_reported() {
        let flags = StateChangedFlags::REINIT_REQUIRED
            .union(StateChangedFlags::RESTORED_ERROR)
            .union(StateChangedFlags::NON_RECOVERABLE_ERROR);
        assert_eq!(
            state_events(flags),
            vec![
                PassthroughStateEvent::NonRecoverableError,
                PassthroughStateEvent::Restored
            ]
        );
    }
}
