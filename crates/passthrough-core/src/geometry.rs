// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passthrough geometry nodes.
//!
//! A geometry node carves projected passthrough into the scene with a mesh.
//! The node is registered with the session while it is in the tree and
//! visible; its geometry instance exists only while it is registered, has a
//! mesh, and the projected layer exists. Instances are never cached: every
//! visibility toggle or passthrough stop destroys them and they are created
//! again from the mesh.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Affine3A, Vec3};
use passthrough_port::{
    GeometryInstanceCreateInfo, GeometryInstanceHandle, GeometryInstanceTransform, GeometryPose,
    LayerPurpose, PassthroughRuntime, TriangleMeshData, TriangleMeshHandle, WindingOrder, XrHost,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{PassthroughSession, PassthroughSignal};

/// Albedo of the editor preview material (unshaded magenta).
pub const PREVIEW_COLOR: [f32; 3] = [1.0, 0.0, 1.0];

/// Shader of the hole-punch material: black, converted to opacity so the
/// projected passthrough shows through.
pub const HOLE_PUNCH_SHADER_CODE: &str = "shader_type spatial;\n\
render_mode blend_mix, depth_draw_opaque, cull_back, shadow_to_opacity, shadows_disabled;\n\
void fragment() {\n\
\tALBEDO = vec3(0.0, 0.0, 0.0);\n\
}\n";

/// Error from geometry node operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The mesh has no vertices.
    #[error("mesh has no vertices")]
    NoVertices,
    /// The mesh has no indices.
    #[error("mesh has no indices")]
    NoIndices,
    /// The index count is not a multiple of 3.
    #[error("index count {0} is not a multiple of 3")]
    IndexCount(usize),
    /// An index points past the vertex buffer.
    #[error("index {index} out of range for {vertices} vertices")]
    IndexOutOfRange {
        /// Offending index value.
        index: u32,
        /// Vertex count.
        vertices: usize,
    },
    /// No node with this id.
    #[error("unknown geometry node {0:?}")]
    UnknownNode(GeometryNodeId),
}

/// Scene-tree notification delivered to a geometry node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneNotification {
    /// The node entered the scene tree.
    EnterTree,
    /// The node left the scene tree.
    ExitTree,
    /// The node's visibility flag changed.
    VisibilityChanged,
    /// The node's local transform changed.
    LocalTransformChanged,
}

/// Session-scoped id of a geometry node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeometryNodeId(pub(crate) u64);

/// Triangle mesh in the host's convention (clockwise front faces).
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryMesh {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl GeometryMesh {
    /// Validate and wrap vertex and index buffers.
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Result<Self, GeometryError> {
        if vertices.is_empty() {
            return Err(GeometryError::NoVertices);
        }
        if indices.is_empty() {
            return Err(GeometryError::NoIndices);
        }
        if indices.len() % 3 != 0 {
            return Err(GeometryError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|i| **i as usize >= vertices.len()) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertices: vertices.len(),
            });
        }
        Ok(Self { vertices, indices })
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Runtime mesh with each triangle re-wound counter-clockwise.
    pub(crate) fn to_triangle_mesh(&self) -> TriangleMeshData {
        TriangleMeshData {
            winding: WindingOrder::Ccw,
            vertices: self.vertices.iter().map(|v| v.to_array()).collect(),
            indices: self
                .indices
                .chunks_exact(3)
                .flat_map(|tri| [tri[0], tri[2], tri[1]])
                .collect(),
        }
    }
}

/// Material of a node's visual-only child mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OpaqueMaterial {
    /// Unshaded flat color.
    Unshaded {
        /// RGB albedo.
        albedo: [f32; 3],
    },
    /// Custom spatial shader.
    Shader {
        /// Shader source.
        code: &'static str,
    },
}

/// Visual-only child mesh kept next to the passthrough geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpaqueChild {
    /// Editor preview of where passthrough will show.
    EditorPreview,
    /// Black mesh that punches through virtual content.
    HolePunch,
}

impl OpaqueChild {
    /// Material the child renders with.
    pub fn material(self) -> OpaqueMaterial {
        match self {
            Self::EditorPreview => OpaqueMaterial::Unshaded {
                albedo: PREVIEW_COLOR,
            },
            Self::HolePunch => OpaqueMaterial::Shader {
                code: HOLE_PUNCH_SHADER_CODE,
            },
        }
    }
}

/// Runtime objects backing a node's geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryInstance {
    /// Geometry instance.
    pub instance: GeometryInstanceHandle,
    /// Triangle mesh owned by the instance.
    pub mesh: TriangleMeshHandle,
}

/// A passthrough geometry node.
#[derive(Clone, Debug)]
pub struct PassthroughGeometryNode {
    mesh: Option<GeometryMesh>,
    instance: Option<GeometryInstance>,
    transform: Affine3A,
    in_tree: bool,
    visible: bool,
    notify_local_transform: bool,
    hole_punch: bool,
    opaque: Option<OpaqueChild>,
}

impl Default for PassthroughGeometryNode {
    fn default() -> Self {
        Self {
            mesh: None,
            instance: None,
            transform: Affine3A::IDENTITY,
            in_tree: false,
            visible: true,
            notify_local_transform: false,
            hole_punch: false,
            opaque: None,
        }
    }
}

impl PassthroughGeometryNode {
    /// The mesh, if set.
    pub fn mesh(&self) -> Option<&GeometryMesh> {
        self.mesh.as_ref()
    }

    /// Runtime objects, while an instance exists.
    pub fn instance(&self) -> Option<GeometryInstance> {
        self.instance
    }

    /// Node transform.
    pub fn transform(&self) -> Affine3A {
        self.transform
    }

    /// Whether the node is in the scene tree.
    pub fn is_in_tree(&self) -> bool {
        self.in_tree
    }

    /// Visibility flag.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether local-transform notifications are enabled.
    pub fn notifies_local_transform(&self) -> bool {
        self.notify_local_transform
    }

    /// Whether hole punching is enabled.
    pub fn hole_punch_enabled(&self) -> bool {
        self.hole_punch
    }

    /// The visual-only child, if one exists.
    pub fn opaque_child(&self) -> Option<OpaqueChild> {
        self.opaque
    }

    fn refresh_opaque_child(&mut self, editor: bool) {
        self.opaque = if editor {
            self.mesh.is_some().then_some(OpaqueChild::EditorPreview)
        } else {
            (self.hole_punch && self.instance.is_some()).then_some(OpaqueChild::HolePunch)
        };
    }
}

#[derive(Debug, Default)]
pub(crate) struct GeometryRegistry {
    nodes: BTreeMap<GeometryNodeId, PassthroughGeometryNode>,
    registered: BTreeSet<GeometryNodeId>,
    next: u64,
}

impl GeometryRegistry {
    pub(crate) fn registered_count(&self) -> usize {
        self.registered.len()
    }

    fn ids(&self) -> Vec<GeometryNodeId> {
        self.nodes.keys().copied().collect()
    }

    fn node_mut(
        &mut self,
        id: GeometryNodeId,
    ) -> Result<&mut PassthroughGeometryNode, GeometryError> {
        self.nodes.get_mut(&id).ok_or(GeometryError::UnknownNode(id))
    }
}

/// Pose of `transform` relative to the tracking origin.
pub(crate) fn geometry_pose(reference_frame: Affine3A, transform: Affine3A) -> GeometryPose {
    let local = reference_frame.inverse() * transform;
    let (scale, orientation, position) = local.to_scale_rotation_translation();
    GeometryPose {
        orientation,
        position,
        scale,
    }
}

impl<R, H> PassthroughSession<R, H> {
    /// The node with this id.
    pub fn geometry_node(&self, id: GeometryNodeId) -> Option<&PassthroughGeometryNode> {
        self.geometry.nodes.get(&id)
    }

    /// Ids of every live node, ascending.
    pub fn geometry_node_ids(&self) -> impl Iterator<Item = GeometryNodeId> + '_ {
        self.geometry.nodes.keys().copied()
    }

    /// Whether the node is registered with the session.
    pub fn is_geometry_registered(&self, id: GeometryNodeId) -> bool {
        self.geometry.registered.contains(&id)
    }

    /// Number of registered nodes.
    pub fn registered_geometry_count(&self) -> usize {
        self.geometry.registered_count()
    }

    /// Number of nodes with a live geometry instance.
    pub fn geometry_instance_count(&self) -> usize {
        self.geometry
            .nodes
            .values()
            .filter(|n| n.instance.is_some())
            .count()
    }

    /// Create a node: visible, outside the tree, without a mesh.
    pub fn create_geometry_node(&mut self) -> GeometryNodeId {
        self.geometry.next += 1;
        let id = GeometryNodeId(self.geometry.next);
        self.geometry
            .nodes
            .insert(id, PassthroughGeometryNode::default());
        id
    }
}

impl<R: PassthroughRuntime, H: XrHost> PassthroughSession<R, H> {
    /// Free a node, taking it out of the tree first.
    pub fn free_geometry_node(&mut self, id: GeometryNodeId) -> Result<(), GeometryError> {
        let in_tree = self.geometry.node_mut(id)?.in_tree;
        if in_tree {
            self.notify_geometry(id, SceneNotification::ExitTree)?;
        }
        self.destroy_instance(id);
        self.geometry.registered.remove(&id);
        self.geometry.nodes.remove(&id);
        Ok(())
    }

    /// Set or clear the node's mesh. Replacing a mesh destroys the old
    /// instance and creates a new one when possible.
    pub fn set_geometry_mesh(
        &mut self,
        id: GeometryNodeId,
        mesh: Option<GeometryMesh>,
    ) -> Result<(), GeometryError> {
        let editor = self.host.is_editor();
        let node = self.geometry.node_mut(id)?;
        if node.mesh == mesh {
            return Ok(());
        }
        let has_mesh = mesh.is_some();
        self.destroy_instance(id);
        let node = self.geometry.node_mut(id)?;
        node.mesh = mesh;
        node.refresh_opaque_child(editor);
        if has_mesh {
            self.create_instance(id);
        }
        Ok(())
    }

    /// Toggle the hole-punch child shown while an instance exists.
    pub fn set_geometry_hole_punch(
        &mut self,
        id: GeometryNodeId,
        enable: bool,
    ) -> Result<(), GeometryError> {
        let editor = self.host.is_editor();
        let node = self.geometry.node_mut(id)?;
        node.hole_punch = enable;
        node.refresh_opaque_child(editor);
        Ok(())
    }

    /// Set the visibility flag, notifying the node if it is in the tree.
    pub fn set_geometry_visible(
        &mut self,
        id: GeometryNodeId,
        visible: bool,
    ) -> Result<(), GeometryError> {
        let node = self.geometry.node_mut(id)?;
        if node.visible == visible {
            return Ok(());
        }
        node.visible = visible;
        if node.in_tree {
            self.notify_geometry(id, SceneNotification::VisibilityChanged)?;
        }
        Ok(())
    }

    /// Set the node transform, notifying the node when local-transform
    /// notifications are enabled.
    pub fn set_geometry_transform(
        &mut self,
        id: GeometryNodeId,
        transform: Affine3A,
    ) -> Result<(), GeometryError> {
        let node = self.geometry.node_mut(id)?;
        node.transform = transform;
        if node.in_tree && node.notify_local_transform {
            self.notify_geometry(id, SceneNotification::LocalTransformChanged)?;
        }
        Ok(())
    }

    /// Deliver a scene-tree notification to a node.
    pub fn notify_geometry(
        &mut self,
        id: GeometryNodeId,
        notification: SceneNotification,
    ) -> Result<(), GeometryError> {
        let node = self.geometry.node_mut(id)?;
        match notification {
            SceneNotification::EnterTree => {
                node.in_tree = true;
                if node.visible {
                    self.register_geometry(id);
                }
            }
            SceneNotification::ExitTree => {
                node.in_tree = false;
                self.unregister_geometry(id);
            }
            SceneNotification::VisibilityChanged => {
                if !node.in_tree {
                    return Ok(());
                }
                if node.visible {
                    self.register_geometry(id);
                } else {
                    self.unregister_geometry(id);
                }
            }
            SceneNotification::LocalTransformChanged => {
                if node.notify_local_transform {
                    self.push_instance_transform(id);
                }
            }
        }
        Ok(())
    }

    /// Push every instance's pose again after the host's reference frame
    /// moved.
    pub fn on_reference_frame_changed(&mut self) {
        for id in self.geometry.ids() {
            self.push_instance_transform(id);
        }
    }

    fn register_geometry(&mut self, id: GeometryNodeId) {
        if self.geometry.registered.insert(id) {
            debug!(?id, "geometry node registered");
        }
        self.create_instance(id);
    }

    fn unregister_geometry(&mut self, id: GeometryNodeId) {
        if self.geometry.registered.remove(&id) {
            debug!(?id, "geometry node unregistered");
        }
        self.destroy_instance(id);
    }

    pub(crate) fn dispatch_to_geometry(&mut self, signal: PassthroughSignal) {
        match signal {
            PassthroughSignal::ProjectedLayerCreated => {
                for id in self.geometry.ids() {
                    self.create_instance(id);
                }
            }
            PassthroughSignal::PassthroughStopped => {
                for id in self.geometry.ids() {
                    self.destroy_instance(id);
                }
            }
            PassthroughSignal::StateChanged(_) => {}
        }
    }

    fn create_instance(&mut self, id: GeometryNodeId) {
        let editor = self.host.is_editor();
        let registered = self.geometry.registered.contains(&id);
        let layer = self.layers.handle(LayerPurpose::Projected);
        let feature = self.feature.handle();
        let Some(node) = self.geometry.nodes.get_mut(&id) else {
            return;
        };
        if node.instance.is_some() || !registered {
            return;
        }
        let Some(mesh) = node.mesh.as_ref() else {
            return;
        };
        let (Some(layer), Some(feature)) = (layer, feature) else {
            debug!(?id, "no projected layer yet, geometry instance deferred");
            return;
        };
        if !self.extensions.fb_triangle_mesh {
            warn!("XR_FB_triangle_mesh not enabled, cannot create passthrough geometry");
            return;
        }

        let mesh = match self.runtime.create_triangle_mesh(&mesh.to_triangle_mesh()) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%err, "failed to create triangle mesh");
                return;
            }
        };
        let info = GeometryInstanceCreateInfo {
            layer,
            mesh,
            base_space: self.host.play_space(),
            pose: geometry_pose(self.host.reference_frame(), node.transform),
        };
        match self.runtime.create_geometry_instance(feature, &info) {
            Ok(instance) => {
                debug!(?id, ?instance, "geometry instance created");
                node.instance = Some(GeometryInstance { instance, mesh });
                node.notify_local_transform = true;
            }
            Err(err) => {
                warn!(%err, "failed to create geometry instance");
                if let Err(err) = self.runtime.destroy_triangle_mesh(mesh) {
                    warn!(%err, "failed to destroy triangle mesh");
                }
            }
        }
        node.refresh_opaque_child(editor);
    }

    fn destroy_instance(&mut self, id: GeometryNodeId) {
        let editor = self.host.is_editor();
        let Some(node) = self.geometry.nodes.get_mut(&id) else {
            return;
        };
        let Some(GeometryInstance { instance, mesh }) = node.instance.take() else {
            return;
        };
        node.notify_local_transform = false;
        if let Err(err) = self.runtime.destroy_geometry_instance(instance) {
            warn!(%err, "failed to destroy geometry instance");
        }
        if let Err(err) = self.runtime.destroy_triangle_mesh(mesh) {
            warn!(%err, "failed to destroy triangle mesh");
        }
        node.refresh_opaque_child(editor);
        debug!(?id, "geometry instance destroyed");
    }

    fn push_instance_transform(&mut self, id: GeometryNodeId) {
        let Some(node) = self.geometry.nodes.get(&id) else {
            return;
        };
        let Some(GeometryInstance { instance, .. }) = node.instance else {
            return;
        };
        let transform = GeometryInstanceTransform {
            base_space: self.host.play_space(),
            time: self.host.predicted_display_time(),
            pose: geometry_pose(self.host.reference_frame(), node.transform),
        };
        if let Err(err) = self
            .runtime
            .set_geometry_instance_transform(instance, &transform)
        {
            warn!(%err, "failed to set geometry instance transform");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn quad() -> GeometryMesh {
        GeometryMesh::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn node_ids_continue_past_u32() {
        use passthrough_mock::{MockHost, MockRuntime};

        let mut s = PassthroughSession::new(MockRuntime::new(), MockHost::new());
        s.geometry.next = u64::from(u32::MAX);
        let id = s.create_geometry_node();
        assert_eq!(id, GeometryNodeId(u64::from(u32::MAX) + 1));
        assert!(s.geometry_node(id).is_some());
    }

    #[test]
    fn mesh_validation() {
        assert_eq!(
            GeometryMesh::new(vec![], vec![0, 1, 2]),
            Err(GeometryError::NoVertices)
        );
        assert_eq!(
            GeometryMesh::new(vec![Vec3::ZERO], vec![]),
            Err(GeometryError::NoIndices)
        );
        assert_eq!(
            GeometryMesh::new(vec![Vec3::ZERO; 3], vec![0, 1]),
            Err(GeometryError::IndexCount(2))
        );
        assert_eq!(
            GeometryMesh::new(vec![Vec3::ZERO; 3], vec![0, 1, 3]),
            Err(GeometryError::IndexOutOfRange {
                index: 3,
                vertices: 3
            })
        );
    }

    #[test]
    fn triangles_are_rewound() {
        let data = quad().to_triangle_mesh();
        assert_eq!(data.winding, WindingOrder::Ccw);
        assert_eq!(data.indices, vec![0, 2, 1, 0, 3, 2]);
        assert_eq!(data.vertices[2], [1.0, 1.0, 0.0]);
        assert_eq!(data.triangle_count(), 2);
    }

    #[test]
    fn pose_is_relative_to_reference_frame() {
        let reference = Affine3A::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let transform = Affine3A::from_scale_rotation_translation(
            Vec3::new(2.0, 2.0, 2.0),
            Quat::from_rotation_y(core::f32::consts::FRAC_PI_2),
            Vec3::new(3.0, 1.0, -2.0),
        );
        let pose = geometry_pose(reference, transform);
        assert!(pose.position.abs_diff_eq(Vec3::new(3.0, 0.0, -2.0), 1e-5));
        assert!(pose.scale.abs_diff_eq(Vec3::splat(2.0), 1e-5));
        assert!(pose
            .orientation
            .abs_diff_eq(Quat::from_rotation_y(core::f32::consts::FRAC_PI_2), 1e-5));
    }

    #[test]
    fn opaque_child_rules() {
        let mut node = PassthroughGeometryNode {
            mesh: Some(quad()),
            ..PassthroughGeometryNode::default()
        };
        node.refresh_opaque_child(true);
        assert_eq!(node.opaque_child(), Some(OpaqueChild::EditorPreview));

        node.refresh_opaque_child(false);
        assert_eq!(node.opaque_child(), None);

        node.hole_punch = true;
        node.instance = Some(GeometryInstance {
            instance: GeometryInstanceHandle(1),
            mesh: TriangleMeshHandle(2),
        });
        node.refresh_opaque_child(false);
        assert_eq!(node.opaque_child(), Some(OpaqueChild::HolePunch));
        assert_eq!(
            OpaqueChild::EditorPreview.material(),
            OpaqueMaterial::Unshaded {
                albedo: [1.0, 0.0, 1.0]
            }
        );
        assert!(matches!(
            OpaqueChild::HolePunch.material(),
            OpaqueMaterial::Shader { code } if code.contains("shadow_to_opacity")
        ));
    }
}
