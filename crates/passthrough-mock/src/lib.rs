// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock adapters for headless testing of the passthrough subsystem.
//!
//! [`MockRuntime`] tracks native objects in maps without touching an XR
//! runtime, records every call, and fails calls on request. [`MockHost`]
//! stands in for the engine's XR interface and compositor.

mod host;
mod runtime;

pub use host::{MockHost, FRAME_PERIOD_NS};
pub use runtime::{
    MockColorLut, MockFeature, MockGeometryInstance, MockLayer, MockRuntime,
    XR_ERROR_FEATURE_ALREADY_CREATED_PASSTHROUGH_FB, XR_ERROR_HANDLE_INVALID,
    XR_ERROR_RUNTIME_FAILURE, XR_ERROR_VALIDATION_FAILURE,
};
