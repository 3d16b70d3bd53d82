// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core enums shared by the runtime and host contracts.

use core::fmt;

/// Declared purpose of a passthrough layer.
///
/// At most one purpose is current at a time; the other, if allocated, is
/// paused so switching back does not require re-creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LayerPurpose {
    /// Full-view camera reconstruction.
    Reconstruction = 0,
    /// Passthrough visible only through user-supplied geometry.
    Projected = 1,
}

impl LayerPurpose {
    /// Every purpose, in slot order.
    pub const ALL: [LayerPurpose; 2] = [LayerPurpose::Reconstruction, LayerPurpose::Projected];

    /// Slot index of this purpose.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LayerPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reconstruction => f.write_str("reconstruction"),
            Self::Projected => f.write_str("projected"),
        }
    }
}

/// Environment blend mode reported by the host's XR interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Virtual content fully replaces the real world.
    #[default]
    Opaque,
    /// Virtual content is added on top of the real world.
    Additive,
    /// Virtual content is alpha-blended with the real world.
    AlphaBlend,
}

/// How the host supports the alpha-blend environment mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlphaBlendSupport {
    /// Not supported; passthrough may emulate it.
    #[default]
    None,
    /// The runtime supports it natively.
    Real,
    /// Another extension already emulates it.
    Emulating,
}

/// Layer creation flags (`XrPassthroughFlagsFB`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerFlags(pub u64);

impl LayerFlags {
    /// `XR_PASSTHROUGH_IS_RUNNING_AT_CREATION_BIT_FB`.
    pub const IS_RUNNING_AT_CREATION: LayerFlags = LayerFlags(0x1);
    /// `XR_PASSTHROUGH_LAYER_DEPTH_BIT_FB`.
    pub const LAYER_DEPTH: LayerFlags = LayerFlags(0x2);

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: LayerFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Parameters for creating a passthrough layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerCreateInfo {
    /// Purpose the layer is created for.
    pub purpose: LayerPurpose,
    /// Creation flags.
    pub flags: LayerFlags,
}
