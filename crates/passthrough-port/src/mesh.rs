// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Triangle mesh and geometry instance payloads.

use glam::{Quat, Vec3};

use crate::{LayerHandle, SpaceHandle, TriangleMeshHandle};

/// Front-face winding of a triangle mesh (`XrWindingOrderFB`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindingOrder {
    /// Clockwise.
    Cw,
    /// Counter-clockwise.
    Ccw,
}

/// Immutable triangle mesh uploaded to the runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleMeshData {
    /// Winding of every triangle in `indices`.
    pub winding: WindingOrder,
    /// Vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
}

impl TriangleMeshData {
    /// Number of triangles described by `indices`.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Pose and scale of a geometry instance relative to a base space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryPose {
    /// Unit orientation.
    pub orientation: Quat,
    /// Position in meters.
    pub position: Vec3,
    /// Non-uniform scale.
    pub scale: Vec3,
}

impl Default for GeometryPose {
    fn default() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Parameters for `xrCreateGeometryInstanceFB`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryInstanceCreateInfo {
    /// Projected layer the geometry belongs to.
    pub layer: LayerHandle,
    /// Mesh to instantiate.
    pub mesh: TriangleMeshHandle,
    /// Space the pose is expressed in.
    pub base_space: SpaceHandle,
    /// Initial pose.
    pub pose: GeometryPose,
}

/// Parameters for `xrGeometryInstanceSetTransformFB`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryInstanceTransform {
    /// Space the pose is expressed in.
    pub base_space: SpaceHandle,
    /// Predicted display time the pose applies to.
    pub time: i64,
    /// New pose.
    pub pose: GeometryPose,
}
