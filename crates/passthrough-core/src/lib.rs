// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passthrough layer lifecycle and style subsystem.
//!
//! [`PassthroughSession`] owns every piece of passthrough state for one XR
//! session: the feature handle, the per-purpose layers, the shared style,
//! color LUT resources and the geometry nodes that punch projected
//! passthrough into the scene. The host drives it through the hook methods
//! (`on_session_created`, `on_process`, `on_event_polled`, ...) in the order
//! its frame loop calls them; the compositor reads the active layer through
//! [`CompositionLayerProvider`](passthrough_port::CompositionLayerProvider).
//!
//! All runtime failures are logged with `tracing` and degrade the session
//! instead of aborting it. Caller mistakes (out-of-range style values,
//! malformed geometry, unknown ids) come back as typed errors.

mod color_lut;
mod composition;
mod driver;
mod events;
mod feature;
mod geometry;
mod layer;
mod session;
mod signal;
mod style;

pub use color_lut::{ColorLut, ColorLutId, ImageFormat, LutError};
pub use composition::COMPOSITION_LAYER_ORDER;
pub use driver::{decide, BlendModeSample, DriverAction};
pub use events::state_events;
pub use geometry::{
    GeometryError, GeometryInstance, GeometryMesh, GeometryNodeId, OpaqueChild, OpaqueMaterial,
    PassthroughGeometryNode, SceneNotification, HOLE_PUNCH_SHADER_CODE, PREVIEW_COLOR,
};
pub use session::PassthroughSession;
pub use signal::{PassthroughSignal, PassthroughStateEvent, SIGNAL_BACKLOG};
pub use style::{BrightnessContrastSaturation, Curve, Gradient, StyleError};
