// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime events delivered during the host's event-poll phase.

/// Flags of `XrEventDataPassthroughStateChangedFB`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StateChangedFlags(pub u32);

impl StateChangedFlags {
    /// `XR_PASSTHROUGH_STATE_CHANGED_REINIT_REQUIRED_BIT_FB`.
    pub const REINIT_REQUIRED: StateChangedFlags = StateChangedFlags(0x1);
    /// `XR_PASSTHROUGH_STATE_CHANGED_NON_RECOVERABLE_ERROR_BIT_FB`.
    pub const NON_RECOVERABLE_ERROR: StateChangedFlags = StateChangedFlags(0x2);
    /// `XR_PASSTHROUGH_STATE_CHANGED_RECOVERABLE_ERROR_BIT_FB`.
    pub const RECOVERABLE_ERROR: StateChangedFlags = StateChangedFlags(0x4);
    /// `XR_PASSTHROUGH_STATE_CHANGED_RESTORED_ERROR_BIT_FB`.
    pub const RESTORED_ERROR: StateChangedFlags = StateChangedFlags(0x8);

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: StateChangedFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bitwise union.
    pub const fn union(self, other: StateChangedFlags) -> StateChangedFlags {
        StateChangedFlags(self.0 | other.0)
    }
}

/// An event polled from the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The passthrough state changed.
    PassthroughStateChanged(StateChangedFlags),
    /// Any event this subsystem does not consume.
    Other,
}
