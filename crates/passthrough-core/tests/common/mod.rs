// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use glam::Vec3;
use passthrough_core::{GeometryMesh, GeometryNodeId, PassthroughSession, SceneNotification};
use passthrough_mock::{MockHost, MockRuntime};
use passthrough_port::{BlendMode, EnabledExtensions, LayerPurpose};

pub type Session = PassthroughSession<MockRuntime, MockHost>;

/// A session with every extension enabled and the XR session created.
pub fn session() -> Session {
    let mut session = PassthroughSession::new(MockRuntime::new(), MockHost::new());
    session.on_instance_created(&EnabledExtensions::all());
    session.on_session_created();
    session
}

pub fn quad() -> GeometryMesh {
    GeometryMesh::new(
        vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
    .expect("quad is valid")
}

/// Run one frame with the given blend mode.
pub fn frame(session: &mut Session, mode: BlendMode) {
    session.host_mut().blend_mode = Some(mode);
    session.host_mut().advance_frame();
    session.on_process();
}

/// A node with a quad mesh, entered into the tree.
pub fn add_node(session: &mut Session) -> GeometryNodeId {
    let id = session.create_geometry_node();
    session.set_geometry_mesh(id, Some(quad())).expect("node");
    session
        .notify_geometry(id, SceneNotification::EnterTree)
        .expect("node");
    id
}

/// Layer invariants that must hold between any two operations.
pub fn assert_layer_invariants(session: &Session) {
    let rt = session.runtime();
    match session.current_passthrough_layer() {
        Some(current) => {
            let handle = session
                .layer_handle(current)
                .expect("current layer has a handle");
            assert!(rt.layers[&handle].running, "current layer is running");
            for purpose in LayerPurpose::ALL.into_iter().filter(|p| *p != current) {
                if let Some(other) = session.layer_handle(purpose) {
                    assert!(!rt.layers[&other].running, "{purpose} layer is paused");
                }
            }
        }
        None => assert_eq!(rt.running_layer_count(), 0, "no layer runs without a current"),
    }
    if LayerPurpose::ALL
        .into_iter()
        .any(|p| session.layer_handle(p).is_some())
    {
        assert!(rt.feature.is_some(), "layers require the feature");
    }
}
