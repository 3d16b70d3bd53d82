// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scenario model, runner and trace.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::{Affine3A, Vec3};
use passthrough_app_core::prefs::PassthroughPrefs;
use passthrough_core::{GeometryMesh, GeometryNodeId, PassthroughSession, SceneNotification};
use passthrough_mock::{MockHost, MockRuntime};
use passthrough_port::{
    AlphaBlendSupport, BlendMode, EnabledExtensions, LayerPurpose, PassthroughCapabilities,
    PassthroughSystemProperties, RuntimeCall, RuntimeEvent, StateChangedFlags,
    FB_PASSTHROUGH_EXTENSION_NAME, FB_TRIANGLE_MESH_EXTENSION_NAME,
    META_PASSTHROUGH_COLOR_LUT_EXTENSION_NAME, META_PASSTHROUGH_PREFERENCES_EXTENSION_NAME,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::prefs::apply_prefs;

type Session = PassthroughSession<MockRuntime, MockHost>;

/// A replayable sequence of frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Name recorded in the trace.
    pub name: String,
    /// Conditions before the first frame.
    #[serde(default)]
    pub setup: Setup,
    /// Frames, in order.
    pub frames: Vec<Frame>,
}

impl Scenario {
    /// Parse a scenario from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid scenario JSON")
    }

    /// Read a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path)
            .with_context(|| format!("failed to open scenario {}", path.display()))?;
        serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("invalid scenario {}", path.display()))
    }
}

/// Instance and session conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Setup {
    /// Alpha-blend support the host reports.
    pub alpha_blend_support: AlphaSupport,
    /// Extension names the runtime enables.
    pub extensions: Vec<String>,
    /// Whether the host runs as an editor.
    pub editor: bool,
    /// Maximum color LUT resolution reported by the system.
    pub max_color_lut_resolution: u32,
    /// Style applied right after session creation.
    pub prefs: Option<PassthroughPrefs>,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            alpha_blend_support: AlphaSupport::None,
            extensions: [
                FB_PASSTHROUGH_EXTENSION_NAME,
                FB_TRIANGLE_MESH_EXTENSION_NAME,
                META_PASSTHROUGH_PREFERENCES_EXTENSION_NAME,
                META_PASSTHROUGH_COLOR_LUT_EXTENSION_NAME,
            ]
            .map(String::from)
            .to_vec(),
            editor: false,
            max_color_lut_resolution: 64,
            prefs: None,
        }
    }
}

/// Serialized [`AlphaBlendSupport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaSupport {
    /// No alpha blend support.
    None,
    /// Native support.
    Real,
    /// Emulated by someone else.
    Emulating,
}

impl From<AlphaSupport> for AlphaBlendSupport {
    fn from(value: AlphaSupport) -> Self {
        match value {
            AlphaSupport::None => Self::None,
            AlphaSupport::Real => Self::Real,
            AlphaSupport::Emulating => Self::Emulating,
        }
    }
}

/// Serialized [`BlendMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blend {
    /// Opaque.
    Opaque,
    /// Additive.
    Additive,
    /// Alpha blend.
    AlphaBlend,
}

impl From<Blend> for BlendMode {
    fn from(value: Blend) -> Self {
        match value {
            Blend::Opaque => Self::Opaque,
            Blend::Additive => Self::Additive,
            Blend::AlphaBlend => Self::AlphaBlend,
        }
    }
}

/// One host frame. Within a frame: failures are armed, events polled, scene
/// and style operations applied, then the session processes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Frame {
    /// Blend mode the host reports; absent means the host reports none.
    pub blend_mode: Option<Blend>,
    /// Runtime calls (OpenXR function names) that fail once.
    pub fail: Vec<String>,
    /// Runtime events polled before processing.
    pub events: Vec<Event>,
    /// Geometry node operations.
    pub nodes: Vec<NodeOp>,
    /// Style changes.
    pub style: Vec<StyleOp>,
    /// Checks after processing.
    pub expect: Option<Expect>,
}

/// A polled runtime event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// `XrEventDataPassthroughStateChangedFB` with these bits.
    StateChanged(Vec<StateFlag>),
    /// Any unrelated event.
    Other,
}

/// A passthrough state-changed bit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateFlag {
    /// Reinitialization required.
    ReinitRequired,
    /// Non-recoverable error.
    NonRecoverableError,
    /// Recoverable error.
    RecoverableError,
    /// Restored from an error.
    Restored,
}

impl From<StateFlag> for StateChangedFlags {
    fn from(value: StateFlag) -> Self {
        match value {
            StateFlag::ReinitRequired => Self::REINIT_REQUIRED,
            StateFlag::NonRecoverableError => Self::NON_RECOVERABLE_ERROR,
            StateFlag::RecoverableError => Self::RECOVERABLE_ERROR,
            StateFlag::Restored => Self::RESTORED_ERROR,
        }
    }
}

/// Mesh shorthand for node operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshSpec {
    /// Unit quad in the XY plane.
    Quad,
    /// Single triangle.
    Triangle,
    /// Explicit buffers (host winding).
    Custom {
        /// Vertex positions.
        vertices: Vec<[f32; 3]>,
        /// Triangle indices.
        indices: Vec<u32>,
    },
}

impl MeshSpec {
    fn build(&self) -> Result<GeometryMesh> {
        let (vertices, indices) = match self {
            Self::Quad => (
                vec![
                    Vec3::new(-0.5, -0.5, 0.0),
                    Vec3::new(0.5, -0.5, 0.0),
                    Vec3::new(0.5, 0.5, 0.0),
                    Vec3::new(-0.5, 0.5, 0.0),
                ],
                vec![0, 1, 2, 0, 2, 3],
            ),
            Self::Triangle => (vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]),
            Self::Custom { vertices, indices } => (
                vertices.iter().copied().map(Vec3::from).collect(),
                indices.clone(),
            ),
        };
        Ok(GeometryMesh::new(vertices, indices)?)
    }
}

/// Operation on a geometry node, addressed by a scenario-local name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum NodeOp {
    /// Create a node.
    Create {
        /// Node name.
        node: String,
    },
    /// Set or clear the mesh.
    SetMesh {
        /// Node name.
        node: String,
        /// New mesh; `null` clears it.
        mesh: Option<MeshSpec>,
    },
    /// Enter the scene tree.
    EnterTree {
        /// Node name.
        node: String,
    },
    /// Leave the scene tree.
    ExitTree {
        /// Node name.
        node: String,
    },
    /// Change visibility.
    SetVisible {
        /// Node name.
        node: String,
        /// New visibility.
        visible: bool,
    },
    /// Move the node.
    SetTranslation {
        /// Node name.
        node: String,
        /// New translation.
        translation: [f32; 3],
    },
    /// Toggle hole punching.
    SetHolePunch {
        /// Node name.
        node: String,
        /// Whether to punch.
        enable: bool,
    },
    /// Free the node.
    Free {
        /// Node name.
        node: String,
    },
}

/// Style change applied through the session setters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StyleOp {
    /// Texture opacity.
    TextureOpacity {
        /// Opacity.
        value: f32,
    },
    /// Edge color.
    EdgeColor {
        /// RGBA.
        color: [f32; 4],
    },
    /// Brightness, contrast and saturation.
    BrightnessContrastSaturation {
        /// Brightness.
        brightness: f32,
        /// Contrast.
        contrast: f32,
        /// Saturation.
        saturation: f32,
    },
}

/// Expected layer after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedLayer {
    /// No current layer.
    None,
    /// Reconstruction is current.
    Reconstruction,
    /// Projected is current.
    Projected,
}

impl From<Option<LayerPurpose>> for ExpectedLayer {
    fn from(value: Option<LayerPurpose>) -> Self {
        match value {
            None => Self::None,
            Some(LayerPurpose::Reconstruction) => Self::Reconstruction,
            Some(LayerPurpose::Projected) => Self::Projected,
        }
    }
}

/// Checks run after a frame; absent fields are not checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expect {
    /// Current layer.
    pub current_layer: Option<ExpectedLayer>,
    /// Whether the feature is started.
    pub started: Option<bool>,
    /// Number of registered geometry nodes.
    pub registered: Option<usize>,
    /// Number of live geometry instances.
    pub instances: Option<usize>,
    /// Signals emitted during the frame, by name.
    pub signals: Option<Vec<String>>,
}

/// State observed after one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTrace {
    /// Frame index.
    pub frame: usize,
    /// Current layer.
    pub current_layer: ExpectedLayer,
    /// Whether the feature is started.
    pub started: bool,
    /// Registered geometry nodes.
    pub registered: usize,
    /// Live geometry instances.
    pub instances: usize,
    /// Signals emitted, by name.
    pub signals: Vec<String>,
    /// Runtime calls made, by OpenXR name.
    pub calls: Vec<String>,
}

/// Full record of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Scenario name.
    pub scenario: String,
    /// Calls made while the session was created.
    pub setup_calls: Vec<String>,
    /// One entry per frame.
    pub frames: Vec<FrameTrace>,
    /// Calls made during session teardown.
    pub teardown_calls: Vec<String>,
}

impl Trace {
    /// Fail at the first difference from `golden`.
    pub fn compare(&self, golden: &Self) -> Result<()> {
        if self.setup_calls != golden.setup_calls {
            bail!(
                "setup calls differ.\nActual:   {:?}\nExpected: {:?}",
                self.setup_calls,
                golden.setup_calls
            );
        }
        for (actual, expected) in self.frames.iter().zip(&golden.frames) {
            if actual != expected {
                bail!(
                    "frame {} differs.\nActual:   {:?}\nExpected: {:?}",
                    actual.frame,
                    actual,
                    expected
                );
            }
        }
        if self.frames.len() != golden.frames.len() {
            bail!(
                "length mismatch. Run has {} frames, golden has {}.",
                self.frames.len(),
                golden.frames.len()
            );
        }
        if self.teardown_calls != golden.teardown_calls {
            bail!(
                "teardown calls differ.\nActual:   {:?}\nExpected: {:?}",
                self.teardown_calls,
                golden.teardown_calls
            );
        }
        Ok(())
    }
}

/// Run a scenario and check its expectations.
pub fn run_scenario(scenario: &Scenario) -> Result<Trace> {
    run_scenario_with_prefs(scenario, None)
}

/// Run a scenario; `prefs` overrides the scenario's own.
pub fn run_scenario_with_prefs(
    scenario: &Scenario,
    prefs: Option<&PassthroughPrefs>,
) -> Result<Trace> {
    let setup = &scenario.setup;
    let mut host = MockHost::new();
    host.alpha_blend_support = setup.alpha_blend_support.into();
    host.editor = setup.editor;

    let mut session = PassthroughSession::new(MockRuntime::new(), host);
    session.on_instance_created(&EnabledExtensions::from_names(
        setup.extensions.iter().map(String::as_str),
    ));
    session.set_system_properties(PassthroughSystemProperties {
        capabilities: PassthroughCapabilities::PASSTHROUGH.union(PassthroughCapabilities::COLOR),
        max_color_lut_resolution: setup.max_color_lut_resolution,
    });
    session.on_session_created();
    if let Some(prefs) = prefs.or(setup.prefs.as_ref()) {
        apply_prefs(&mut session, prefs)?;
    }
    session.on_state_ready();
    let setup_calls = take_call_names(&mut session);
    session.drain_signals();

    let mut nodes = BTreeMap::new();
    let mut frames = Vec::with_capacity(scenario.frames.len());
    for (index, frame) in scenario.frames.iter().enumerate() {
        let trace = run_frame(&mut session, &mut nodes, index, frame)
            .with_context(|| format!("frame {index}"))?;
        frames.push(trace);
    }

    session.on_session_destroyed();
    session.on_instance_destroyed();
    let teardown_calls = take_call_names(&mut session);
    info!(scenario = %scenario.name, frames = frames.len(), "scenario complete");

    Ok(Trace {
        scenario: scenario.name.clone(),
        setup_calls,
        frames,
        teardown_calls,
    })
}

fn run_frame(
    session: &mut Session,
    nodes: &mut BTreeMap<String, GeometryNodeId>,
    index: usize,
    frame: &Frame,
) -> Result<FrameTrace> {
    for name in &frame.fail {
        let call = RuntimeCall::from_name(name)
            .with_context(|| format!("unknown runtime call {name:?}"))?;
        session.runtime_mut().fail_next(call);
    }

    session.host_mut().blend_mode = frame.blend_mode.map(BlendMode::from);
    session.host_mut().advance_frame();

    for event in &frame.events {
        let event = match event {
            Event::StateChanged(flags) => RuntimeEvent::PassthroughStateChanged(
                flags
                    .iter()
                    .map(|f| StateChangedFlags::from(*f))
                    .fold(StateChangedFlags::default(), StateChangedFlags::union),
            ),
            Event::Other => RuntimeEvent::Other,
        };
        let consumed = session.on_event_polled(&event);
        debug!(?event, consumed, "event polled");
    }

    for op in &frame.nodes {
        apply_node_op(session, nodes, op)?;
    }
    for op in &frame.style {
        apply_style_op(session, op)?;
    }

    session.on_process();

    let trace = FrameTrace {
        frame: index,
        current_layer: session.current_passthrough_layer().into(),
        started: session.is_passthrough_started(),
        registered: session.registered_geometry_count(),
        instances: session.geometry_instance_count(),
        signals: session
            .drain_signals()
            .iter()
            .map(ToString::to_string)
            .collect(),
        calls: take_call_names(session),
    };
    if let Some(expect) = &frame.expect {
        check(&trace, expect)?;
    }
    Ok(trace)
}

fn node_id(nodes: &BTreeMap<String, GeometryNodeId>, name: &str) -> Result<GeometryNodeId> {
    nodes
        .get(name)
        .copied()
        .with_context(|| format!("unknown node {name:?}"))
}

fn apply_node_op(
    session: &mut Session,
    nodes: &mut BTreeMap<String, GeometryNodeId>,
    op: &NodeOp,
) -> Result<()> {
    match op {
        NodeOp::Create { node } => {
            if nodes.contains_key(node) {
                bail!("node {node:?} already exists");
            }
            let id = session.create_geometry_node();
            nodes.insert(node.clone(), id);
        }
        NodeOp::SetMesh { node, mesh } => {
            let mesh = mesh.as_ref().map(MeshSpec::build).transpose()?;
            session.set_geometry_mesh(node_id(nodes, node)?, mesh)?;
        }
        NodeOp::EnterTree { node } => {
            session.notify_geometry(node_id(nodes, node)?, SceneNotification::EnterTree)?;
        }
        NodeOp::ExitTree { node } => {
            session.notify_geometry(node_id(nodes, node)?, SceneNotification::ExitTree)?;
        }
        NodeOp::SetVisible { node, visible } => {
            session.set_geometry_visible(node_id(nodes, node)?, *visible)?;
        }
        NodeOp::SetTranslation { node, translation } => {
            let transform = Affine3A::from_translation(Vec3::from(*translation));
            session.set_geometry_transform(node_id(nodes, node)?, transform)?;
        }
        NodeOp::SetHolePunch { node, enable } => {
            session.set_geometry_hole_punch(node_id(nodes, node)?, *enable)?;
        }
        NodeOp::Free { node } => {
            let id = node_id(nodes, node)?;
            session.free_geometry_node(id)?;
            nodes.remove(node);
        }
    }
    Ok(())
}

fn apply_style_op(session: &mut Session, op: &StyleOp) -> Result<()> {
    match *op {
        StyleOp::TextureOpacity { value } => session.set_texture_opacity_factor(value),
        StyleOp::EdgeColor { color } => session.set_edge_color(color),
        StyleOp::BrightnessContrastSaturation {
            brightness,
            contrast,
            saturation,
        } => session.set_brightness_contrast_saturation(brightness, contrast, saturation)?,
    }
    Ok(())
}

fn take_call_names(session: &mut Session) -> Vec<String> {
    session
        .runtime_mut()
        .take_calls()
        .into_iter()
        .map(|call| call.name().to_owned())
        .collect()
}

fn check(trace: &FrameTrace, expect: &Expect) -> Result<()> {
    if let Some(layer) = expect.current_layer {
        if trace.current_layer != layer {
            bail!(
                "current layer: expected {layer:?}, found {:?}",
                trace.current_layer
            );
        }
    }
    if let Some(started) = expect.started {
        if trace.started != started {
            bail!("started: expected {started}, found {}", trace.started);
        }
    }
    if let Some(registered) = expect.registered {
        if trace.registered != registered {
            bail!(
                "registered nodes: expected {registered}, found {}",
                trace.registered
            );
        }
    }
    if let Some(instances) = expect.instances {
        if trace.instances != instances {
            bail!(
                "geometry instances: expected {instances}, found {}",
                trace.instances
            );
        }
    }
    if let Some(signals) = &expect.signals {
        if &trace.signals != signals {
            bail!(
                "signals: expected {signals:?}, found {:?}",
                trace.signals
            );
        }
    }
    Ok(())
}
