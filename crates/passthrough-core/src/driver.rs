// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blend-mode driver: picks the layer the current frame needs.

use passthrough_port::{BlendMode, LayerPurpose};
use tracing::debug;

/// What the driver asks the layer manager to do this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverAction {
    /// Make the given purpose current.
    StartLayer(LayerPurpose),
    /// Tear down every layer.
    StopAll,
}

/// Decide the action for one frame.
///
/// Reconstruction wins whenever the host asks for alpha blend. Otherwise the
/// projected layer runs while at least one geometry node is registered, and
/// passthrough stops when none are. Returns `None` when the current layer
/// already matches.
pub fn decide(
    mode: BlendMode,
    current: Option<LayerPurpose>,
    registered: usize,
) -> Option<DriverAction> {
    let alpha_blend = mode == BlendMode::AlphaBlend;
    if alpha_blend {
        return (current != Some(LayerPurpose::Reconstruction))
            .then_some(DriverAction::StartLayer(LayerPurpose::Reconstruction));
    }
    if registered > 0 {
        return (current != Some(LayerPurpose::Projected))
            .then_some(DriverAction::StartLayer(LayerPurpose::Projected));
    }
    current.is_some().then_some(DriverAction::StopAll)
}

/// One frame's blend mode next to the previous frame's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendModeSample {
    /// Previous frame's mode; `None` on the first sample.
    pub previous: Option<BlendMode>,
    /// This frame's mode.
    pub current: BlendMode,
}

impl BlendModeSample {
    /// Whether the mode differs from the previous frame.
    pub fn changed(&self) -> bool {
        self.previous != Some(self.current)
    }
}

#[derive(Debug, Default)]
pub(crate) struct BlendModeDriver {
    last: Option<BlendModeSample>,
}

impl BlendModeDriver {
    pub(crate) fn sample(&mut self, mode: BlendMode) -> BlendModeSample {
        let sample = BlendModeSample {
            previous: self.last.map(|last| last.current),
            current: mode,
        };
        if sample.changed() {
            debug!(previous = ?sample.previous, current = ?mode, "environment blend mode changed");
        }
        self.last = Some(sample);
        sample
    }

    pub(crate) fn last(&self) -> Option<BlendModeSample> {
        self.last
    }

    pub(crate) fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: LayerPurpose = LayerPurpose::Reconstruction;
    const P: LayerPurpose = LayerPurpose::Projected;

    #[test]
    fn alpha_blend_takes_priority_over_geometry() {
        assert_eq!(
            decide(BlendMode::AlphaBlend, Some(P), 3),
            Some(DriverAction::StartLayer(R))
        );
        assert_eq!(decide(BlendMode::AlphaBlend, Some(R), 3), None);
        assert_eq!(
            decide(BlendMode::AlphaBlend, None, 0),
            Some(DriverAction::StartLayer(R))
        );
    }

    #[test]
    fn geometry_drives_projected_layer_outside_alpha_blend() {
        for mode in [BlendMode::Opaque, BlendMode::Additive] {
            assert_eq!(decide(mode, None, 1), Some(DriverAction::StartLayer(P)));
            assert_eq!(decide(mode, Some(R), 2), Some(DriverAction::StartLayer(P)));
            assert_eq!(decide(mode, Some(P), 1), None);
        }
    }

    #[test]
    fn no_geometry_stops_whatever_runs() {
        assert_eq!(
            decide(BlendMode::Opaque, Some(R), 0),
            Some(DriverAction::StopAll)
        );
        assert_eq!(
            decide(BlendMode::Opaque, Some(P), 0),
            Some(DriverAction::StopAll)
        );
        assert_eq!(decide(BlendMode::Opaque, None, 0), None);
    }

    #[test]
    fn sample_tracks_previous_mode() {
        let mut driver = BlendModeDriver::default();
        let first = driver.sample(BlendMode::Opaque);
        assert!(first.changed());
        assert_eq!(first.previous, None);

        let second = driver.sample(BlendMode::Opaque);
        assert!(!second.changed());

        let third = driver.sample(BlendMode::AlphaBlend);
        assert!(third.changed());
        assert_eq!(third.previous, Some(BlendMode::Opaque));

        driver.reset();
        assert_eq!(driver.last(), None);
    }
}
