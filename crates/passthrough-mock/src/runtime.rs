// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory [`PassthroughRuntime`] with a call log and failure injection.

use std::collections::{BTreeMap, BTreeSet};

use passthrough_port::{
    ColorLutChannels, ColorLutCreateInfo, ColorLutHandle, FeatureHandle,
    GeometryInstanceCreateInfo, GeometryInstanceHandle, GeometryInstanceTransform, GeometryPose,
    LayerCreateInfo, LayerFlags, LayerHandle, LayerPurpose, PassthroughPreferences,
    PassthroughRuntime, PassthroughStyle, RuntimeCall, RuntimeError, SpaceHandle,
    TriangleMeshData, TriangleMeshHandle,
};

/// `XR_ERROR_VALIDATION_FAILURE`.
pub const XR_ERROR_VALIDATION_FAILURE: i32 = -1;
/// `XR_ERROR_RUNTIME_FAILURE`; the code used for injected failures.
pub const XR_ERROR_RUNTIME_FAILURE: i32 = -2;
/// `XR_ERROR_HANDLE_INVALID`.
pub const XR_ERROR_HANDLE_INVALID: i32 = -12;
/// `XR_ERROR_FEATURE_ALREADY_CREATED_PASSTHROUGH_FB`.
pub const XR_ERROR_FEATURE_ALREADY_CREATED_PASSTHROUGH_FB: i32 = -1000118001;

/// The passthrough feature object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockFeature {
    /// Handle returned by `create_passthrough`.
    pub handle: FeatureHandle,
    /// Whether the feature is started.
    pub running: bool,
}

/// A passthrough layer object.
#[derive(Clone, Debug, PartialEq)]
pub struct MockLayer {
    /// Purpose the layer was created with.
    pub purpose: LayerPurpose,
    /// Creation flags.
    pub flags: LayerFlags,
    /// Whether the layer is resumed.
    pub running: bool,
    /// Last style applied.
    pub style: Option<PassthroughStyle>,
    /// Number of `set_layer_style` calls.
    pub style_updates: u32,
}

/// A geometry instance object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MockGeometryInstance {
    /// Projected layer the instance belongs to.
    pub layer: LayerHandle,
    /// Instantiated mesh.
    pub mesh: TriangleMeshHandle,
    /// Space the pose is expressed in.
    pub base_space: SpaceHandle,
    /// Current pose.
    pub pose: GeometryPose,
    /// Display time of the last transform update.
    pub last_time: Option<i64>,
}

/// A color LUT object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockColorLut {
    /// Channel layout.
    pub channels: ColorLutChannels,
    /// Cells per axis.
    pub resolution: u32,
    /// Copied LUT bytes.
    pub data: Vec<u8>,
}

/// Mock runtime for testing.
///
/// Objects live in ordered maps keyed by handle, so assertions and traces are
/// deterministic. Handles are never reused within one mock.
#[derive(Debug)]
pub struct MockRuntime {
    /// The feature, if created.
    pub feature: Option<MockFeature>,
    /// Live layers.
    pub layers: BTreeMap<LayerHandle, MockLayer>,
    /// Live triangle meshes.
    pub meshes: BTreeMap<TriangleMeshHandle, TriangleMeshData>,
    /// Live geometry instances.
    pub instances: BTreeMap<GeometryInstanceHandle, MockGeometryInstance>,
    /// Live color LUTs.
    pub luts: BTreeMap<ColorLutHandle, MockColorLut>,
    /// Value returned by `passthrough_preferences`.
    pub preferences: PassthroughPreferences,
    /// Every call made, in order, including failed ones.
    pub calls: Vec<RuntimeCall>,
    fail_next: Vec<RuntimeCall>,
    fail_always: BTreeSet<RuntimeCall>,
    next_handle: u64,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self {
            feature: None,
            layers: BTreeMap::new(),
            meshes: BTreeMap::new(),
            instances: BTreeMap::new(),
            luts: BTreeMap::new(),
            preferences: PassthroughPreferences::default(),
            calls: Vec::new(),
            fail_next: Vec::new(),
            fail_always: BTreeSet::new(),
            next_handle: 1,
        }
    }
}

impl MockRuntime {
    /// Create a new mock runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call to `call` once.
    pub fn fail_next(&mut self, call: RuntimeCall) {
        self.fail_next.push(call);
    }

    /// Fail every call to `call` until [`MockRuntime::clear_failures`].
    pub fn fail_always(&mut self, call: RuntimeCall) {
        self.fail_always.insert(call);
    }

    /// Drop all pending failure injections.
    pub fn clear_failures(&mut self) {
        self.fail_next.clear();
        self.fail_always.clear();
    }

    /// How many times `call` was made.
    pub fn call_count(&self, call: RuntimeCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    /// Take the call log, leaving it empty.
    pub fn take_calls(&mut self) -> Vec<RuntimeCall> {
        std::mem::take(&mut self.calls)
    }

    /// Whether the feature exists and is started.
    pub fn is_feature_running(&self) -> bool {
        self.feature.is_some_and(|f| f.running)
    }

    /// The live layer with the given purpose.
    pub fn layer_for(&self, purpose: LayerPurpose) -> Option<(LayerHandle, &MockLayer)> {
        self.layers
            .iter()
            .find(|(_, layer)| layer.purpose == purpose)
            .map(|(handle, layer)| (*handle, layer))
    }

    /// Number of layers currently resumed.
    pub fn running_layer_count(&self) -> usize {
        self.layers.values().filter(|l| l.running).count()
    }

    fn record(&mut self, call: RuntimeCall) -> Result<(), RuntimeError> {
        self.calls.push(call);
        if self.fail_always.contains(&call) {
            return Err(failed(call, XR_ERROR_RUNTIME_FAILURE));
        }
        if let Some(pos) = self.fail_next.iter().position(|c| *c == call) {
            self.fail_next.remove(pos);
            return Err(failed(call, XR_ERROR_RUNTIME_FAILURE));
        }
        Ok(())
    }

    fn alloc(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn feature_mut(
        &mut self,
        call: RuntimeCall,
        handle: FeatureHandle,
    ) -> Result<&mut MockFeature, RuntimeError> {
        match self.feature.as_mut() {
            Some(feature) if feature.handle == handle => Ok(feature),
            _ => Err(failed(call, XR_ERROR_HANDLE_INVALID)),
        }
    }

    fn layer_mut(
        &mut self,
        call: RuntimeCall,
        handle: LayerHandle,
    ) -> Result<&mut MockLayer, RuntimeError> {
        self.layers
            .get_mut(&handle)
            .ok_or_else(|| failed(call, XR_ERROR_HANDLE_INVALID))
    }
}

fn failed(call: RuntimeCall, code: i32) -> RuntimeError {
    RuntimeError::Failed { call, code }
}

impl PassthroughRuntime for MockRuntime {
    fn create_passthrough(&mut self) -> Result<FeatureHandle, RuntimeError> {
        let call = RuntimeCall::CreatePassthrough;
        self.record(call)?;
        if self.feature.is_some() {
            return Err(failed(call, XR_ERROR_FEATURE_ALREADY_CREATED_PASSTHROUGH_FB));
        }
        let handle = FeatureHandle(self.alloc());
        self.feature = Some(MockFeature {
            handle,
            running: false,
        });
        Ok(handle)
    }

    fn destroy_passthrough(&mut self, feature: FeatureHandle) -> Result<(), RuntimeError> {
        let call = RuntimeCall::DestroyPassthrough;
        self.record(call)?;
        self.feature_mut(call, feature)?;
        // Child objects go with their parent.
        self.feature = None;
        self.layers.clear();
        self.luts.clear();
        Ok(())
    }

    fn start_passthrough(&mut self, feature: FeatureHandle) -> Result<(), RuntimeError> {
        let call = RuntimeCall::StartPassthrough;
        self.record(call)?;
        self.feature_mut(call, feature)?.running = true;
        Ok(())
    }

    fn pause_passthrough(&mut self, feature: FeatureHandle) -> Result<(), RuntimeError> {
        let call = RuntimeCall::PausePassthrough;
        self.record(call)?;
        self.feature_mut(call, feature)?.running = false;
        Ok(())
    }

    fn create_layer(
        &mut self,
        feature: FeatureHandle,
        info: &LayerCreateInfo,
    ) -> Result<LayerHandle, RuntimeError> {
        let call = RuntimeCall::CreateLayer;
        self.record(call)?;
        self.feature_mut(call, feature)?;
        let handle = LayerHandle(self.alloc());
        self.layers.insert(
            handle,
            MockLayer {
                purpose: info.purpose,
                flags: info.flags,
                running: info.flags.contains(LayerFlags::IS_RUNNING_AT_CREATION),
                style: None,
                style_updates: 0,
            },
        );
        Ok(handle)
    }

    fn destroy_layer(&mut self, layer: LayerHandle) -> Result<(), RuntimeError> {
        let call = RuntimeCall::DestroyLayer;
        self.record(call)?;
        self.layers
            .remove(&layer)
            .map(|_| ())
            .ok_or_else(|| failed(call, XR_ERROR_HANDLE_INVALID))
    }

    fn pause_layer(&mut self, layer: LayerHandle) -> Result<(), RuntimeError> {
        let call = RuntimeCall::PauseLayer;
        self.record(call)?;
        self.layer_mut(call, layer)?.running = false;
        Ok(())
    }

    fn resume_layer(&mut self, layer: LayerHandle) -> Result<(), RuntimeError> {
        let call = RuntimeCall::ResumeLayer;
        self.record(call)?;
        self.layer_mut(call, layer)?.running = true;
        Ok(())
    }

    fn set_layer_style(
        &mut self,
        layer: LayerHandle,
        style: &PassthroughStyle,
    ) -> Result<(), RuntimeError> {
        let call = RuntimeCall::SetLayerStyle;
        self.record(call)?;
        let layer = self.layer_mut(call, layer)?;
        layer.style = Some(style.clone());
        layer.style_updates += 1;
        Ok(())
    }

    fn create_triangle_mesh(
        &mut self,
        mesh: &TriangleMeshData,
    ) -> Result<TriangleMeshHandle, RuntimeError> {
        let call = RuntimeCall::CreateTriangleMesh;
        self.record(call)?;
        if mesh.indices.len() % 3 != 0 {
            return Err(failed(call, XR_ERROR_VALIDATION_FAILURE));
        }
        let handle = TriangleMeshHandle(self.alloc());
        self.meshes.insert(handle, mesh.clone());
        Ok(handle)
    }

    fn destroy_triangle_mesh(&mut self, mesh: TriangleMeshHandle) -> Result<(), RuntimeError> {
        let call = RuntimeCall::DestroyTriangleMesh;
        self.record(call)?;
        self.meshes
            .remove(&mesh)
            .map(|_| ())
            .ok_or_else(|| failed(call, XR_ERROR_HANDLE_INVALID))
    }

    fn create_geometry_instance(
        &mut self,
        feature: FeatureHandle,
        info: &GeometryInstanceCreateInfo,
    ) -> Result<GeometryInstanceHandle, RuntimeError> {
        let call = RuntimeCall::CreateGeometryInstance;
        self.record(call)?;
        self.feature_mut(call, feature)?;
        let layer_is_projected = self
            .layers
            .get(&info.layer)
            .is_some_and(|l| l.purpose == LayerPurpose::Projected);
        if !layer_is_projected || !self.meshes.contains_key(&info.mesh) {
            return Err(failed(call, XR_ERROR_HANDLE_INVALID));
        }
        let handle = GeometryInstanceHandle(self.alloc());
        self.instances.insert(
            handle,
            MockGeometryInstance {
                layer: info.layer,
                mesh: info.mesh,
                base_space: info.base_space,
                pose: info.pose,
                last_time: None,
            },
        );
        Ok(handle)
    }

    fn destroy_geometry_instance(
        &mut self,
        instance: GeometryInstanceHandle,
    ) -> Result<(), RuntimeError> {
        let call = RuntimeCall::DestroyGeometryInstance;
        self.record(call)?;
        self.instances
            .remove(&instance)
            .map(|_| ())
            .ok_or_else(|| failed(call, XR_ERROR_HANDLE_INVALID))
    }

    fn set_geometry_instance_transform(
        &mut self,
        instance: GeometryInstanceHandle,
        transform: &GeometryInstanceTransform,
    ) -> Result<(), RuntimeError> {
        let call = RuntimeCall::SetGeometryInstanceTransform;
        self.record(call)?;
        let instance = self
            .instances
            .get_mut(&instance)
            .ok_or_else(|| failed(call, XR_ERROR_HANDLE_INVALID))?;
        instance.base_space = transform.base_space;
        instance.pose = transform.pose;
        instance.last_time = Some(transform.time);
        Ok(())
    }

    fn passthrough_preferences(&mut self) -> Result<PassthroughPreferences, RuntimeError> {
        self.record(RuntimeCall::GetPassthroughPreferences)?;
        Ok(self.preferences)
    }

    fn create_color_lut(
        &mut self,
        feature: FeatureHandle,
        info: &ColorLutCreateInfo<'_>,
    ) -> Result<ColorLutHandle, RuntimeError> {
        let call = RuntimeCall::CreateColorLut;
        self.record(call)?;
        self.feature_mut(call, feature)?;
        let cells = (info.resolution as usize).pow(3);
        if info.data.len() != cells * info.channels.count() {
            return Err(failed(call, XR_ERROR_VALIDATION_FAILURE));
        }
        let handle = ColorLutHandle(self.alloc());
        self.luts.insert(
            handle,
            MockColorLut {
                channels: info.channels,
                resolution: info.resolution,
                data: info.data.to_vec(),
            },
        );
        Ok(handle)
    }

    fn destroy_color_lut(&mut self, lut: ColorLutHandle) -> Result<(), RuntimeError> {
        let call = RuntimeCall::DestroyColorLut;
        self.record(call)?;
        self.luts
            .remove(&lut)
            .map(|_| ())
            .ok_or_else(|| failed(call, XR_ERROR_HANDLE_INVALID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(rt: &mut MockRuntime) -> FeatureHandle {
        rt.create_passthrough().expect("create_passthrough")
    }

    #[test]
    fn test_layer_running_at_creation_follows_flag() {
        let mut rt = MockRuntime::new();
        let f = feature(&mut rt);
        let running = rt
            .create_layer(
                f,
                &LayerCreateInfo {
                    purpose: LayerPurpose::Reconstruction,
                    flags: LayerFlags::IS_RUNNING_AT_CREATION,
                },
            )
            .ok();
        let paused = rt
            .create_layer(
                f,
                &LayerCreateInfo {
                    purpose: LayerPurpose::Projected,
                    flags: LayerFlags::default(),
                },
            )
            .ok();
        assert!(running.is_some() && paused.is_some());
        assert_eq!(rt.running_layer_count(), 1);
        assert_eq!(
            rt.layer_for(LayerPurpose::Reconstruction).map(|(_, l)| l.running),
            Some(true)
        );
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let mut rt = MockRuntime::new();
        rt.fail_next(RuntimeCall::CreatePassthrough);
        assert_eq!(
            rt.create_passthrough(),
            Err(RuntimeError::Failed {
                call: RuntimeCall::CreatePassthrough,
                code: XR_ERROR_RUNTIME_FAILURE,
            })
        );
        assert!(rt.create_passthrough().is_ok());
        assert_eq!(rt.call_count(RuntimeCall::CreatePassthrough), 2);
    }

    #[test]
    fn test_fail_always_until_cleared() {
        let mut rt = MockRuntime::new();
        let f = feature(&mut rt);
        rt.fail_always(RuntimeCall::StartPassthrough);
        assert!(rt.start_passthrough(f).is_err());
        assert!(rt.start_passthrough(f).is_err());
        rt.clear_failures();
        assert!(rt.start_passthrough(f).is_ok());
        assert!(rt.is_feature_running());
    }

    #[test]
    fn test_destroying_feature_destroys_layers() {
        let mut rt = MockRuntime::new();
        let f = feature(&mut rt);
        let info = LayerCreateInfo {
            purpose: LayerPurpose::Projected,
            flags: LayerFlags::IS_RUNNING_AT_CREATION,
        };
        assert!(rt.create_layer(f, &info).is_ok());
        assert!(rt.destroy_passthrough(f).is_ok());
        assert!(rt.layers.is_empty());
        assert!(rt.feature.is_none());
    }

    #[test]
    fn test_stale_handles_are_rejected() {
        let mut rt = MockRuntime::new();
        assert_eq!(
            rt.destroy_layer(LayerHandle(99)),
            Err(RuntimeError::Failed {
                call: RuntimeCall::DestroyLayer,
                code: XR_ERROR_HANDLE_INVALID,
            })
        );
        assert!(rt.start_passthrough(FeatureHandle(42)).is_err());
    }

    #[test]
    fn test_color_lut_size_is_validated() {
        let mut rt = MockRuntime::new();
        let f = feature(&mut rt);
        let data = vec![0u8; 2 * 2 * 2 * 3];
        let ok = rt.create_color_lut(
            f,
            &ColorLutCreateInfo {
                channels: ColorLutChannels::Rgb,
                resolution: 2,
                data: &data,
            },
        );
        assert!(ok.is_ok());
        let bad = rt.create_color_lut(
            f,
            &ColorLutCreateInfo {
                channels: ColorLutChannels::Rgba,
                resolution: 2,
                data: &data,
            },
        );
        assert!(bad.is_err());
        assert_eq!(rt.luts.len(), 1);
    }
}
