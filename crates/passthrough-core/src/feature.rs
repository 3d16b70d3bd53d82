// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passthrough feature handle and its started flag.

use passthrough_port::{FeatureHandle, PassthroughRuntime, XrHost};
use tracing::{debug, info, warn};

/// Owns the one feature handle of a session.
///
/// Creating the handle also makes the session a composition layer provider
/// and turns on alpha-blend emulation; destroying it undoes both.
#[derive(Debug, Default)]
pub(crate) struct FeatureController {
    handle: Option<FeatureHandle>,
    started: bool,
}

impl FeatureController {
    pub(crate) fn handle(&self) -> Option<FeatureHandle> {
        self.handle
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started
    }

    /// Create the feature handle if absent. Returns whether a handle exists.
    pub(crate) fn create<R: PassthroughRuntime, H: XrHost>(
        &mut self,
        runtime: &mut R,
        host: &mut H,
    ) -> bool {
        if self.handle.is_some() {
            return true;
        }
        match runtime.create_passthrough() {
            Ok(handle) => {
                info!(?handle, "passthrough feature created");
                self.handle = Some(handle);
                host.register_composition_layer_provider();
                host.set_emulate_environment_blend_mode_alpha_blend(true);
                true
            }
            Err(err) => {
                warn!(%err, "failed to create passthrough");
                false
            }
        }
    }

    /// Create (if needed) and start the feature. Idempotent.
    pub(crate) fn ensure_started<R: PassthroughRuntime, H: XrHost>(
        &mut self,
        runtime: &mut R,
        host: &mut H,
    ) -> bool {
        if self.started {
            return true;
        }
        if !self.create(runtime, host) {
            return false;
        }
        let Some(handle) = self.handle else {
            return false;
        };
        match runtime.start_passthrough(handle) {
            Ok(()) => {
                debug!(?handle, "passthrough started");
                self.started = true;
                true
            }
            Err(err) => {
                warn!(%err, "failed to start passthrough");
                false
            }
        }
    }

    /// Pause the feature and clear the started flag.
    pub(crate) fn pause<R: PassthroughRuntime>(&mut self, runtime: &mut R) {
        if let Some(handle) = self.handle {
            if let Err(err) = runtime.pause_passthrough(handle) {
                warn!(%err, "unable to pause passthrough feature");
            }
        }
        self.started = false;
    }

    /// Destroy the handle. The caller destroys layers first.
    pub(crate) fn destroy<R: PassthroughRuntime, H: XrHost>(
        &mut self,
        runtime: &mut R,
        host: &mut H,
    ) {
        self.started = false;
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(err) = runtime.destroy_passthrough(handle) {
            warn!(%err, "unable to destroy passthrough feature");
        }
        host.unregister_composition_layer_provider();
        host.set_emulate_environment_blend_mode_alpha_blend(false);
        info!(?handle, "passthrough feature destroyed");
    }
}
