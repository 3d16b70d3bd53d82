// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passthrough port contract.
//!
//! This crate defines the boundary between the passthrough layer subsystem
//! and its two black-box collaborators: the XR runtime (which owns the
//! native passthrough objects) and the host engine (which owns blend mode,
//! reference frame, and the compositor). It contains NO lifecycle logic;
//! that lives in `passthrough-core`.
//!
//! # Design Principles
//!
//! - **Handles are opaque**: The runtime hands out `u64` handles; callers
//!   never interpret them.
//! - **Every call is fallible**: Runtime calls return `Result`, never panic.
//!   What a failure means is decided by the caller.
//! - **No time ownership**: Display times and frame boundaries come from the
//!   host.

mod composition;
mod error;
mod events;
mod handles;
mod lut;
mod mesh;
mod port;
mod style;
mod system;
mod types;

pub use composition::{CompositionLayer, CompositionLayerFlags, CompositionLayerProvider};
pub use error::{RuntimeCall, RuntimeError};
pub use events::{RuntimeEvent, StateChangedFlags};
pub use handles::{
    ColorLutHandle, FeatureHandle, GeometryInstanceHandle, LayerHandle, SpaceHandle,
    TriangleMeshHandle,
};
pub use lut::{ColorLutChannels, ColorLutCreateInfo};
pub use mesh::{
    GeometryInstanceCreateInfo, GeometryInstanceTransform, GeometryPose, TriangleMeshData,
    WindingOrder,
};
pub use port::{PassthroughRuntime, XrHost};
pub use style::{ColorRgba, PassthroughFilter, PassthroughStyle, StyleFilter, COLOR_MAP_MONO_SIZE};
pub use system::{
    EnabledExtensions, PassthroughCapabilities, PassthroughPreferences,
    PassthroughSystemProperties, FB_PASSTHROUGH_EXTENSION_NAME, FB_TRIANGLE_MESH_EXTENSION_NAME,
    META_PASSTHROUGH_COLOR_LUT_EXTENSION_NAME, META_PASSTHROUGH_PREFERENCES_EXTENSION_NAME,
};
pub use types::{AlphaBlendSupport, BlendMode, LayerCreateInfo, LayerFlags, LayerPurpose};
