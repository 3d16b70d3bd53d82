// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Opaque runtime handles.
//!
//! A handle is only ever produced by a successful runtime call. The null
//! handle is expressed as `Option::None` by owners, never as a zero value.

/// Handle to the passthrough feature (`XrPassthroughFB`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureHandle(pub u64);

/// Handle to a passthrough layer (`XrPassthroughLayerFB`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerHandle(pub u64);

/// Handle to a geometry instance (`XrGeometryInstanceFB`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeometryInstanceHandle(pub u64);

/// Handle to a triangle mesh (`XrTriangleMeshFB`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriangleMeshHandle(pub u64);

/// Handle to a passthrough color LUT (`XrPassthroughColorLutMETA`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColorLutHandle(pub u64);

/// Handle to a reference space (`XrSpace`), owned by the host.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpaceHandle(pub u64);
