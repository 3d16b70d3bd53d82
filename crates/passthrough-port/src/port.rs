// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port traits for the XR runtime and the host engine.

use glam::Affine3A;

use crate::{
    AlphaBlendSupport, BlendMode, ColorLutCreateInfo, ColorLutHandle, FeatureHandle,
    GeometryInstanceCreateInfo, GeometryInstanceHandle, GeometryInstanceTransform,
    LayerCreateInfo, LayerHandle, PassthroughPreferences, PassthroughStyle, RuntimeError,
    SpaceHandle, TriangleMeshData, TriangleMeshHandle,
};

/// XR runtime port: the native passthrough entry points.
///
/// Implementors own the native objects behind the handles they return.
/// Every call is fallible; callers decide whether a failure aborts the
/// current operation or is merely logged.
///
/// # Handle validity
///
/// Passing a handle that was already destroyed is a caller bug. Adapters may
/// report it as a failure but must not panic.
pub trait PassthroughRuntime {
    /// `xrCreatePassthroughFB`. The feature is created paused.
    fn create_passthrough(&mut self) -> Result<FeatureHandle, RuntimeError>;

    /// `xrDestroyPassthroughFB`.
    fn destroy_passthrough(&mut self, feature: FeatureHandle) -> Result<(), RuntimeError>;

    /// `xrPassthroughStartFB`.
    fn start_passthrough(&mut self, feature: FeatureHandle) -> Result<(), RuntimeError>;

    /// `xrPassthroughPauseFB`.
    fn pause_passthrough(&mut self, feature: FeatureHandle) -> Result<(), RuntimeError>;

    /// `xrCreatePassthroughLayerFB`.
    fn create_layer(
        &mut self,
        feature: FeatureHandle,
        info: &LayerCreateInfo,
    ) -> Result<LayerHandle, RuntimeError>;

    /// `xrDestroyPassthroughLayerFB`.
    fn destroy_layer(&mut self, layer: LayerHandle) -> Result<(), RuntimeError>;

    /// `xrPassthroughLayerPauseFB`.
    fn pause_layer(&mut self, layer: LayerHandle) -> Result<(), RuntimeError>;

    /// `xrPassthroughLayerResumeFB`.
    fn resume_layer(&mut self, layer: LayerHandle) -> Result<(), RuntimeError>;

    /// `xrPassthroughLayerSetStyleFB` with the filter chained in.
    fn set_layer_style(
        &mut self,
        layer: LayerHandle,
        style: &PassthroughStyle,
    ) -> Result<(), RuntimeError>;

    /// `xrCreateTriangleMeshFB` (immutable mesh).
    fn create_triangle_mesh(
        &mut self,
        mesh: &TriangleMeshData,
    ) -> Result<TriangleMeshHandle, RuntimeError>;

    /// `xrDestroyTriangleMeshFB`.
    fn destroy_triangle_mesh(&mut self, mesh: TriangleMeshHandle) -> Result<(), RuntimeError>;

    /// `xrCreateGeometryInstanceFB`.
    fn create_geometry_instance(
        &mut self,
        feature: FeatureHandle,
        info: &GeometryInstanceCreateInfo,
    ) -> Result<GeometryInstanceHandle, RuntimeError>;

    /// `xrDestroyGeometryInstanceFB`.
    fn destroy_geometry_instance(
        &mut self,
        instance: GeometryInstanceHandle,
    ) -> Result<(), RuntimeError>;

    /// `xrGeometryInstanceSetTransformFB`.
    fn set_geometry_instance_transform(
        &mut self,
        instance: GeometryInstanceHandle,
        transform: &GeometryInstanceTransform,
    ) -> Result<(), RuntimeError>;

    /// `xrGetPassthroughPreferencesMETA`.
    fn passthrough_preferences(&mut self) -> Result<PassthroughPreferences, RuntimeError>;

    /// `xrCreatePassthroughColorLutMETA`.
    fn create_color_lut(
        &mut self,
        feature: FeatureHandle,
        info: &ColorLutCreateInfo<'_>,
    ) -> Result<ColorLutHandle, RuntimeError>;

    /// `xrDestroyPassthroughColorLutMETA`.
    fn destroy_color_lut(&mut self, lut: ColorLutHandle) -> Result<(), RuntimeError>;
}

/// Host engine port: the XR interface and scene-space services.
pub trait XrHost {
    /// Current environment blend mode, `None` when the XR interface is
    /// unavailable.
    fn environment_blend_mode(&self) -> Option<BlendMode>;

    /// How alpha blend is supported before this subsystem gets involved.
    fn alpha_blend_support(&self) -> AlphaBlendSupport;

    /// Adds the session to the compositor's layer providers.
    fn register_composition_layer_provider(&mut self);

    /// Removes the session from the compositor's layer providers.
    fn unregister_composition_layer_provider(&mut self);

    /// Tells the host that alpha blend is emulated by passthrough.
    fn set_emulate_environment_blend_mode_alpha_blend(&mut self, enabled: bool);

    /// World-to-tracking reference frame.
    fn reference_frame(&self) -> Affine3A;

    /// Play space geometry poses are expressed in.
    fn play_space(&self) -> SpaceHandle;

    /// Predicted display time of the frame being built.
    fn predicted_display_time(&self) -> i64;

    /// Whether the host is running its editor rather than the application.
    fn is_editor(&self) -> bool;
}
