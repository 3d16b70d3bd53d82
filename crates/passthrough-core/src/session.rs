// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The per-session context and the host hook sequence.

use passthrough_port::{
    AlphaBlendSupport, BlendMode, EnabledExtensions, PassthroughCapabilities,
    PassthroughPreferences, PassthroughRuntime, PassthroughSystemProperties, XrHost,
    FB_PASSTHROUGH_EXTENSION_NAME, FB_TRIANGLE_MESH_EXTENSION_NAME,
    META_PASSTHROUGH_COLOR_LUT_EXTENSION_NAME, META_PASSTHROUGH_PREFERENCES_EXTENSION_NAME,
};
use tracing::{debug, info, warn};

use crate::color_lut::ColorLutRegistry;
use crate::driver::{decide, BlendModeDriver, BlendModeSample, DriverAction};
use crate::feature::FeatureController;
use crate::geometry::GeometryRegistry;
use crate::layer::LayerManager;
use crate::signal::SignalQueue;
use crate::style::StyleState;
use crate::PassthroughSignal;

const REQUESTED_EXTENSIONS: [&str; 4] = [
    FB_PASSTHROUGH_EXTENSION_NAME,
    FB_TRIANGLE_MESH_EXTENSION_NAME,
    META_PASSTHROUGH_PREFERENCES_EXTENSION_NAME,
    META_PASSTHROUGH_COLOR_LUT_EXTENSION_NAME,
];

/// Passthrough state for one XR session.
///
/// `R` talks to the OpenXR runtime and `H` is the engine hosting the
/// session. Nothing here is global: dropping the session after
/// [`on_session_destroyed`](Self::on_session_destroyed) releases everything.
#[derive(Debug)]
pub struct PassthroughSession<R, H> {
    pub(crate) runtime: R,
    pub(crate) host: H,
    pub(crate) extensions: EnabledExtensions,
    pub(crate) properties: PassthroughSystemProperties,
    supported: bool,
    session_running: bool,
    pub(crate) feature: FeatureController,
    pub(crate) layers: LayerManager,
    pub(crate) style: StyleState,
    pub(crate) luts: ColorLutRegistry,
    pub(crate) driver: BlendModeDriver,
    pub(crate) geometry: GeometryRegistry,
    pub(crate) signals: SignalQueue,
}

impl<R, H> PassthroughSession<R, H> {
    /// Wrap a runtime and host. Nothing is created until
    /// [`on_session_created`](Self::on_session_created).
    pub fn new(runtime: R, host: H) -> Self {
        Self {
            runtime,
            host,
            extensions: EnabledExtensions::default(),
            properties: PassthroughSystemProperties::default(),
            supported: false,
            session_running: false,
            feature: FeatureController::default(),
            layers: LayerManager::default(),
            style: StyleState::default(),
            luts: ColorLutRegistry::default(),
            driver: BlendModeDriver::default(),
            geometry: GeometryRegistry::default(),
            signals: SignalQueue::default(),
        }
    }

    /// Extensions to request at instance creation.
    pub fn requested_extensions() -> &'static [&'static str] {
        &REQUESTED_EXTENSIONS
    }

    /// The runtime port.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The runtime port, mutably.
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    /// The host port.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host port, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Extensions the runtime enabled.
    pub fn enabled_extensions(&self) -> EnabledExtensions {
        self.extensions
    }

    /// Record which requested extensions were enabled.
    pub fn on_instance_created(&mut self, enabled: &EnabledExtensions) {
        self.extensions = *enabled;
        debug!(extensions = ?enabled, "passthrough extensions recorded");
    }

    /// Record the system's passthrough properties.
    pub fn set_system_properties(&mut self, properties: PassthroughSystemProperties) {
        self.properties = properties;
    }

    /// Forget the instance-level state.
    pub fn on_instance_destroyed(&mut self) {
        self.extensions = EnabledExtensions::default();
        self.properties = PassthroughSystemProperties::default();
        self.supported = false;
    }

    /// Whether this session drives passthrough at all.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub(crate) fn is_active(&self) -> bool {
        self.supported && self.session_running
    }

    /// Environment blend mode seen on the last processed frame.
    pub fn last_blend_mode(&self) -> Option<BlendMode> {
        self.driver.last().map(|sample| sample.current)
    }

    /// Blend mode of the last processed frame next to the one before it.
    pub fn last_blend_mode_sample(&self) -> Option<BlendModeSample> {
        self.driver.last()
    }

    /// Signals delivered since the last drain, in emission order. At most
    /// [`SIGNAL_BACKLOG`](crate::SIGNAL_BACKLOG) are kept; older undrained
    /// signals are dropped with a warning.
    pub fn drain_signals(&mut self) -> Vec<PassthroughSignal> {
        self.signals.drain()
    }

    /// Whether the system supports passthrough.
    pub fn has_passthrough_capability(&self) -> bool {
        self.properties
            .capabilities
            .contains(PassthroughCapabilities::PASSTHROUGH)
    }

    /// Whether the system supports color passthrough.
    pub fn has_color_passthrough_capability(&self) -> bool {
        self.properties.capabilities.contains(
            PassthroughCapabilities::PASSTHROUGH.union(PassthroughCapabilities::COLOR),
        )
    }

    /// Whether the system supports passthrough with depth.
    pub fn has_layer_depth_passthrough_capability(&self) -> bool {
        self.properties.capabilities.contains(
            PassthroughCapabilities::PASSTHROUGH.union(PassthroughCapabilities::LAYER_DEPTH),
        )
    }
}

impl<R: PassthroughRuntime, H: XrHost> PassthroughSession<R, H> {
    /// Create the feature handle unless the host already blends alpha.
    pub fn on_session_created(&mut self) {
        self.session_running = true;
        if !self.extensions.fb_passthrough {
            warn!("XR_FB_passthrough not enabled, passthrough unsupported");
            self.supported = false;
            return;
        }
        let support = self.host.alpha_blend_support();
        if support != AlphaBlendSupport::None {
            warn!(?support, "alpha blend already supported, passthrough disabled");
            self.supported = false;
            return;
        }
        self.supported = true;
        if !self.feature.create(&mut self.runtime, &mut self.host) {
            warn!("passthrough feature unavailable until a layer is requested");
        }
    }

    /// Seed the layer decision once the session is ready.
    pub fn on_state_ready(&mut self) {
        self.drive();
    }

    /// Per-frame update: sample the blend mode and switch layers.
    pub fn on_process(&mut self) {
        self.drive();
    }

    fn drive(&mut self) {
        if !self.is_active() {
            return;
        }
        let mode = self
            .host
            .environment_blend_mode()
            .unwrap_or(BlendMode::Opaque);
        self.driver.sample(mode);
        let registered = self.geometry.registered_count();
        match decide(mode, self.layers.current(), registered) {
            Some(DriverAction::StartLayer(purpose)) => self.start_layer_inner(purpose),
            Some(DriverAction::StopAll) => self.stop_all_inner(),
            None => {}
        }
        self.flush_signals();
    }

    /// Stop passthrough and destroy the feature handle.
    pub fn stop_and_destroy_all(&mut self) {
        if !self.supported {
            return;
        }
        self.stop_and_destroy_all_inner();
        self.flush_signals();
    }

    fn stop_and_destroy_all_inner(&mut self) {
        self.stop_all_inner();
        self.feature.destroy(&mut self.runtime, &mut self.host);
        self.luts.forget_handles();
    }

    /// Tear down everything tied to the XR session.
    pub fn on_session_destroyed(&mut self) {
        if self.supported {
            self.stop_and_destroy_all_inner();
            self.flush_signals();
            info!("passthrough session destroyed");
        }
        self.driver.reset();
        self.session_running = false;
        self.supported = false;
    }

    /// Whether the runtime prefers passthrough on by default.
    pub fn is_passthrough_preferred(&mut self) -> bool {
        if !self.extensions.meta_passthrough_preferences {
            debug!("XR_META_passthrough_preferences not enabled");
            return false;
        }
        match self.runtime.passthrough_preferences() {
            Ok(prefs) => prefs.contains(PassthroughPreferences::DEFAULT_TO_ACTIVE),
            Err(err) => {
                warn!(%err, "failed to get passthrough preferences");
                false
            }
        }
    }

    /// Dispatch pending signals to geometry nodes, then queue them for the
    /// application. Signals raised during dispatch are handled in the same
    /// pass.
    pub(crate) fn flush_signals(&mut self) {
        loop {
            let pending = self.signals.take_pending();
            if pending.is_empty() {
                return;
            }
            for signal in pending {
                self.dispatch_to_geometry(signal);
                self.signals.deliver(signal);
            }
        }
    }
}
