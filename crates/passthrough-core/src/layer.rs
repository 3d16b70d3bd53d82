// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-purpose passthrough layers.
//!
//! Each purpose moves through `Absent → Active → Paused → Active ...` and is
//! only destroyed by a full stop. At most one purpose is current; the other,
//! if allocated, is paused.

use passthrough_port::{
    LayerCreateInfo, LayerFlags, LayerHandle, LayerPurpose, PassthroughRuntime, XrHost,
};
use tracing::{debug, info, warn};

use crate::{PassthroughSession, PassthroughSignal};

#[derive(Debug, Default)]
pub(crate) struct LayerManager {
    handles: [Option<LayerHandle>; 2],
    current: Option<LayerPurpose>,
}

impl LayerManager {
    pub(crate) fn handle(&self, purpose: LayerPurpose) -> Option<LayerHandle> {
        self.handles[purpose.index()]
    }

    pub(crate) fn current(&self) -> Option<LayerPurpose> {
        self.current
    }

    pub(crate) fn current_handle(&self) -> Option<LayerHandle> {
        self.current.and_then(|purpose| self.handle(purpose))
    }

    fn any_allocated(&self) -> bool {
        self.handles.iter().any(Option::is_some)
    }
}

impl<R, H> PassthroughSession<R, H> {
    /// Purpose of the layer currently composited, if any.
    pub fn current_passthrough_layer(&self) -> Option<LayerPurpose> {
        self.layers.current()
    }

    /// Handle of the layer allocated for `purpose`, if any.
    pub fn layer_handle(&self, purpose: LayerPurpose) -> Option<LayerHandle> {
        self.layers.handle(purpose)
    }

    /// Whether the passthrough feature is started.
    pub fn is_passthrough_started(&self) -> bool {
        self.feature.is_started()
    }
}

impl<R: PassthroughRuntime, H: XrHost> PassthroughSession<R, H> {
    /// Create and start the passthrough feature if needed. Idempotent;
    /// returns whether the feature is started.
    pub fn ensure_started(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        if self.feature.ensure_started(&mut self.runtime, &mut self.host) {
            return true;
        }
        self.stop_all_inner();
        self.flush_signals();
        false
    }

    /// Make `purpose` the current layer, pausing the other one.
    ///
    /// The layer is created on first use and resumed afterwards. A creation
    /// failure stops passthrough entirely; pause, resume and style failures
    /// are logged and the switch goes ahead.
    pub fn start_layer(&mut self, purpose: LayerPurpose) {
        if !self.is_active() {
            return;
        }
        self.start_layer_inner(purpose);
        self.flush_signals();
    }

    pub(crate) fn start_layer_inner(&mut self, purpose: LayerPurpose) {
        if purpose == LayerPurpose::Projected && self.geometry.registered_count() == 0 {
            debug!("starting projected layer with no registered geometry");
        }
        if !self.feature.ensure_started(&mut self.runtime, &mut self.host) {
            warn!(%purpose, "cannot start layer, passthrough failed to start");
            self.stop_all_inner();
            return;
        }
        let Some(feature) = self.feature.handle() else {
            return;
        };

        if let Some(other) = self.layers.current().filter(|p| *p != purpose) {
            if let Some(handle) = self.layers.handle(other) {
                if let Err(err) = self.runtime.pause_layer(handle) {
                    warn!(%err, %other, "failed to pause current passthrough layer");
                }
            }
        }

        match self.layers.handle(purpose) {
            None => {
                let info = LayerCreateInfo {
                    purpose,
                    flags: LayerFlags::IS_RUNNING_AT_CREATION,
                };
                match self.runtime.create_layer(feature, &info) {
                    Ok(handle) => {
                        info!(%purpose, ?handle, "passthrough layer created");
                        self.layers.handles[purpose.index()] = Some(handle);
                        if purpose == LayerPurpose::Projected {
                            self.signals.emit(PassthroughSignal::ProjectedLayerCreated);
                        }
                    }
                    Err(err) => {
                        warn!(%err, %purpose, "failed to create passthrough layer");
                        self.stop_all_inner();
                        return;
                    }
                }
            }
            Some(handle) => {
                if let Err(err) = self.runtime.resume_layer(handle) {
                    warn!(%err, %purpose, "failed to resume passthrough layer");
                }
            }
        }

        self.layers.current = Some(purpose);
        debug!(%purpose, "passthrough layer current");
        self.apply_style();
    }

    /// Destroy every layer and pause the feature. No-op when nothing is
    /// started; otherwise emits [`PassthroughSignal::PassthroughStopped`].
    pub fn stop_all(&mut self) {
        if !self.is_active() {
            return;
        }
        self.stop_all_inner();
        self.flush_signals();
    }

    pub(crate) fn stop_all_inner(&mut self) {
        if !self.feature.is_started() && !self.layers.any_allocated() {
            return;
        }
        for purpose in LayerPurpose::ALL {
            if let Some(handle) = self.layers.handles[purpose.index()].take() {
                if let Err(err) = self.runtime.destroy_layer(handle) {
                    warn!(%err, %purpose, "unable to destroy passthrough layer");
                }
            }
        }
        self.feature.pause(&mut self.runtime);
        self.layers.current = None;
        info!("passthrough stopped");
        self.signals.emit(PassthroughSignal::PassthroughStopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_handle_follows_current_purpose() {
        let mut layers = LayerManager::default();
        assert_eq!(layers.current_handle(), None);
        layers.handles[LayerPurpose::Projected.index()] = Some(LayerHandle(7));
        assert_eq!(layers.current_handle(), None);
        assert!(layers.any_allocated());
        layers.current = Some(LayerPurpose::Projected);
        assert_eq!(layers.current_handle(), Some(LayerHandle(7)));
        assert_eq!(layers.handle(LayerPurpose::Reconstruction), None);
    }
}
