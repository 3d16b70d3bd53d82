// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Composition layer provider contract read by the host compositor.

use crate::{LayerHandle, SpaceHandle};

/// Composition layer flags (`XrCompositionLayerFlags`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompositionLayerFlags(pub u64);

impl CompositionLayerFlags {
    /// `XR_COMPOSITION_LAYER_BLEND_TEXTURE_SOURCE_ALPHA_BIT`.
    pub const BLEND_TEXTURE_SOURCE_ALPHA: CompositionLayerFlags = CompositionLayerFlags(0x2);
}

/// One `XrCompositionLayerPassthroughFB` submitted with the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositionLayer {
    /// Layer flags.
    pub flags: CompositionLayerFlags,
    /// Unused by passthrough layers; always `None`.
    pub space: Option<SpaceHandle>,
    /// Passthrough layer to composite.
    pub layer: LayerHandle,
}

/// Read-only view the compositor queries once per frame (pre-render).
///
/// # Ordering
///
/// The compositor reads this after the frame's process step, so the layer
/// returned is the one chosen by that frame's blend-mode decision.
pub trait CompositionLayerProvider {
    /// Number of layers to submit this frame.
    fn composition_layer_count(&self) -> usize;

    /// Layer at `index`, or `None` when out of range.
    fn composition_layer(&self, index: usize) -> Option<CompositionLayer>;

    /// Sort order of the layer at `index`; negative values sort behind the
    /// projection layer.
    fn composition_layer_order(&self, index: usize) -> i32;
}
