// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signals emitted by the session.

use core::fmt;
use std::collections::VecDeque;

use tracing::warn;

/// Undrained signals kept for the application; older ones are dropped first.
pub const SIGNAL_BACKLOG: usize = 64;

/// Asynchronous passthrough condition reported by the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassthroughStateEvent {
    /// Passthrough cannot recover; the application should fall back.
    NonRecoverableError,
    /// Passthrough is temporarily unavailable.
    RecoverableError,
    /// Passthrough recovered from a recoverable error.
    Restored,
}

/// Something the application or geometry nodes may react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassthroughSignal {
    /// The projected layer was just created.
    ProjectedLayerCreated,
    /// Every layer was destroyed and the feature paused.
    PassthroughStopped,
    /// The runtime reported a state change.
    StateChanged(PassthroughStateEvent),
}

impl fmt::Display for PassthroughSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectedLayerCreated => f.write_str("projected_layer_created"),
            Self::PassthroughStopped => f.write_str("passthrough_stopped"),
            Self::StateChanged(PassthroughStateEvent::NonRecoverableError) => {
                f.write_str("state_changed:non_recoverable_error")
            }
            Self::StateChanged(PassthroughStateEvent::RecoverableError) => {
                f.write_str("state_changed:recoverable_error")
            }
            Self::StateChanged(PassthroughStateEvent::Restored) => {
                f.write_str("state_changed:restored")
            }
        }
    }
}

/// Two-stage queue: signals wait in `pending` until geometry nodes have seen
/// them, then move to `outbox` for the application. The outbox holds at most
/// [`SIGNAL_BACKLOG`] entries.
#[derive(Debug, Default)]
pub(crate) struct SignalQueue {
    pending: Vec<PassthroughSignal>,
    outbox: VecDeque<PassthroughSignal>,
    dropped: usize,
}

impl SignalQueue {
    pub(crate) fn emit(&mut self, signal: PassthroughSignal) {
        self.pending.push(signal);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<PassthroughSignal> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn deliver(&mut self, signal: PassthroughSignal) {
        if self.outbox.len() == SIGNAL_BACKLOG {
            if let Some(oldest) = self.outbox.pop_front() {
                if self.dropped == 0 {
                    warn!(%oldest, "signal backlog full, dropping oldest undrained signals");
                }
                self.dropped += 1;
            }
        }
        self.outbox.push_back(signal);
    }

    pub(crate) fn drain(&mut self) -> Vec<PassthroughSignal> {
        if self.dropped > 0 {
            warn!(dropped = self.dropped, "undrained signals were dropped");
            self.dropped = 0;
        }
        self.outbox.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_signals_reach_outbox_only_after_delivery() {
        let mut queue = SignalQueue::default();
        queue.emit(PassthroughSignal::ProjectedLayerCreated);
        assert!(queue.drain().is_empty());

        for signal in queue.take_pending() {
            queue.deliver(signal);
        }
        assert_eq!(queue.drain(), vec![PassthroughSignal::ProjectedLayerCreated]);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn backlog_keeps_the_newest_signals() {
        let mut queue = SignalQueue::default();
        queue.deliver(PassthroughSignal::ProjectedLayerCreated);
        for _ in 0..SIGNAL_BACKLOG {
            queue.deliver(PassthroughSignal::PassthroughStopped);
        }
        let drained = queue.drain();
        assert_eq!(drained.len(), SIGNAL_BACKLOG);
        assert!(drained
            .iter()
            .all(|s| *s == PassthroughSignal::PassthroughStopped));
        assert_eq!(queue.dropped, 0);
    }

    #[test]
    fn display_names_are_stable() {
        assert_eq!(
            PassthroughSignal::StateChanged(PassthroughStateEvent::Restored).to_string(),
            "state_changed:restored"
        );
        assert_eq!(
            PassthroughSignal::PassthroughStopped.to_string(),
            "passthrough_stopped"
        );
    }
}
