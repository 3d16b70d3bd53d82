// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Compositor view of the session.

use passthrough_port::{CompositionLayer, CompositionLayerFlags, CompositionLayerProvider};

use crate::PassthroughSession;

/// Sort order of the passthrough layer; behind the projection layer.
pub const COMPOSITION_LAYER_ORDER: i32 = -100;

impl<R, H> CompositionLayerProvider for PassthroughSession<R, H> {
    fn composition_layer_count(&self) -> usize {
        usize::from(self.feature.is_started() && self.layers.current_handle().is_some())
    }

    fn composition_layer(&self, index: usize) -> Option<CompositionLayer> {
        if index != 0 || !self.feature.is_started() {
            return None;
        }
        self.layers.current_handle().map(|layer| CompositionLayer {
            flags: CompositionLayerFlags::BLEND_TEXTURE_SOURCE_ALPHA,
            space: None,
            layer,
        })
    }

    fn composition_layer_order(&self, _index: usize) -> i32 {
        COMPOSITION_LAYER_ORDER
    }
}
