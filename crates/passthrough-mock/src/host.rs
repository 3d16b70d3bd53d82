// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory [`XrHost`].

use glam::Affine3A;
use passthrough_port::{AlphaBlendSupport, BlendMode, SpaceHandle, XrHost};

/// Nominal frame period used by [`MockHost::advance_frame`] (72 Hz, in ns).
pub const FRAME_PERIOD_NS: i64 = 13_888_889;

/// Mock host engine.
///
/// All state is public; tests flip fields between frames.
#[derive(Debug, Clone)]
pub struct MockHost {
    /// Blend mode reported by the XR interface; `None` = no interface.
    pub blend_mode: Option<BlendMode>,
    /// Alpha-blend support reported before passthrough is involved.
    pub alpha_blend_support: AlphaBlendSupport,
    /// Whether a composition layer provider is registered.
    pub provider_registered: bool,
    /// Number of provider registrations ever made.
    pub registrations: u32,
    /// Whether alpha-blend emulation is enabled.
    pub emulating_alpha_blend: bool,
    /// World-to-tracking reference frame.
    pub reference_frame: Affine3A,
    /// Play space handle.
    pub play_space: SpaceHandle,
    /// Predicted display time of the current frame.
    pub predicted_display_time: i64,
    /// Whether the host is its editor.
    pub editor: bool,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            blend_mode: Some(BlendMode::Opaque),
            alpha_blend_support: AlphaBlendSupport::None,
            provider_registered: false,
            registrations: 0,
            emulating_alpha_blend: false,
            reference_frame: Affine3A::IDENTITY,
            play_space: SpaceHandle(1),
            predicted_display_time: 0,
            editor: false,
        }
    }
}

impl MockHost {
    /// Create a new mock host reporting `Opaque`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the predicted display time by one frame.
    pub fn advance_frame(&mut self) {
        self.predicted_display_time += FRAME_PERIOD_NS;
    }
}

impl XrHost for MockHost {
    fn environment_blend_mode(&self) -> Option<BlendMode> {
        self.blend_mode
    }

    fn alpha_blend_support(&self) -> AlphaBlendSupport {
        self.alpha_blend_support
    }

    fn register_composition_layer_provider(&mut self) {
        self.provider_registered = true;
        self.registrations += 1;
    }

    fn unregister_composition_layer_provider(&mut self) {
        self.provider_registered = false;
    }

    fn set_emulate_environment_blend_mode_alpha_blend(&mut self, enabled: bool) {
        self.emulating_alpha_blend = enabled;
    }

    fn reference_frame(&self) -> Affine3A {
        self.reference_frame
    }

    fn play_space(&self) -> SpaceHandle {
        self.play_space
    }

    fn predicted_display_time(&self) -> i64 {
        self.predicted_display_time
    }

    fn is_editor(&self) -> bool {
        self.editor
    }
}
