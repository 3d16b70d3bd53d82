// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime call identifiers and the error every runtime call can return.

use core::fmt;

use thiserror::Error;

/// Identifies a runtime entry point, for logging and failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuntimeCall {
    /// `xrCreatePassthroughFB`.
    CreatePassthrough,
    /// `xrDestroyPassthroughFB`.
    DestroyPassthrough,
    /// `xrPassthroughStartFB`.
    StartPassthrough,
    /// `xrPassthroughPauseFB`.
    PausePassthrough,
    /// `xrCreatePassthroughLayerFB`.
    CreateLayer,
    /// `xrDestroyPassthroughLayerFB`.
    DestroyLayer,
    /// `xrPassthroughLayerPauseFB`.
    PauseLayer,
    /// `xrPassthroughLayerResumeFB`.
    ResumeLayer,
    /// `xrPassthroughLayerSetStyleFB`.
    SetLayerStyle,
    /// `xrCreateTriangleMeshFB`.
    CreateTriangleMesh,
    /// `xrDestroyTriangleMeshFB`.
    DestroyTriangleMesh,
    /// `xrCreateGeometryInstanceFB`.
    CreateGeometryInstance,
    /// `xrDestroyGeometryInstanceFB`.
    DestroyGeometryInstance,
    /// `xrGeometryInstanceSetTransformFB`.
    SetGeometryInstanceTransform,
    /// `xrGetPassthroughPreferencesMETA`.
    GetPassthroughPreferences,
    /// `xrCreatePassthroughColorLutMETA`.
    CreateColorLut,
    /// `xrDestroyPassthroughColorLutMETA`.
    DestroyColorLut,
}

impl RuntimeCall {
    /// Every entry point, in declaration order.
    pub const ALL: [RuntimeCall; 17] = [
        Self::CreatePassthrough,
        Self::DestroyPassthrough,
        Self::StartPassthrough,
        Self::PausePassthrough,
        Self::CreateLayer,
        Self::DestroyLayer,
        Self::PauseLayer,
        Self::ResumeLayer,
        Self::SetLayerStyle,
        Self::CreateTriangleMesh,
        Self::DestroyTriangleMesh,
        Self::CreateGeometryInstance,
        Self::DestroyGeometryInstance,
        Self::SetGeometryInstanceTransform,
        Self::GetPassthroughPreferences,
        Self::CreateColorLut,
        Self::DestroyColorLut,
    ];

    /// Look up an entry point by its OpenXR function name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|call| call.name() == name)
    }

    /// The OpenXR function name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreatePassthrough => "xrCreatePassthroughFB",
            Self::DestroyPassthrough => "xrDestroyPassthroughFB",
            Self::StartPassthrough => "xrPassthroughStartFB",
            Self::PausePassthrough => "xrPassthroughPauseFB",
            Self::CreateLayer => "xrCreatePassthroughLayerFB",
            Self::DestroyLayer => "xrDestroyPassthroughLayerFB",
            Self::PauseLayer => "xrPassthroughLayerPauseFB",
            Self::ResumeLayer => "xrPassthroughLayerResumeFB",
            Self::SetLayerStyle => "xrPassthroughLayerSetStyleFB",
            Self::CreateTriangleMesh => "xrCreateTriangleMeshFB",
            Self::DestroyTriangleMesh => "xrDestroyTriangleMeshFB",
            Self::CreateGeometryInstance => "xrCreateGeometryInstanceFB",
            Self::DestroyGeometryInstance => "xrDestroyGeometryInstanceFB",
            Self::SetGeometryInstanceTransform => "xrGeometryInstanceSetTransformFB",
            Self::GetPassthroughPreferences => "xrGetPassthroughPreferencesMETA",
            Self::CreateColorLut => "xrCreatePassthroughColorLutMETA",
            Self::DestroyColorLut => "xrDestroyPassthroughColorLutMETA",
        }
    }
}

impl fmt::Display for RuntimeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned by a runtime call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The call returned a failing `XrResult`.
    #[error("{call} failed, error code: {code}")]
    Failed {
        /// Which call failed.
        call: RuntimeCall,
        /// Raw `XrResult` value (negative).
        code: i32,
    },
    /// The extension providing the call was not loaded.
    #[error("{call} is not available")]
    Unavailable {
        /// Which call was attempted.
        call: RuntimeCall,
    },
}

impl RuntimeError {
    /// The call that failed.
    pub const fn call(&self) -> RuntimeCall {
        match self {
            Self::Failed { call, .. } | Self::Unavailable { call } => *call,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for call in RuntimeCall::ALL {
            assert_eq!(RuntimeCall::from_name(call.name()), Some(call));
        }
        assert_eq!(RuntimeCall::from_name("xrCreateSwapchain"), None);
    }

    #[test]
    fn error_message_names_call_and_code() {
        let err = RuntimeError::Failed {
            call: RuntimeCall::CreateLayer,
            code: -2,
        };
        assert_eq!(
            err.to_string(),
            "xrCreatePassthroughLayerFB failed, error code: -2"
        );
        assert_eq!(err.call(), RuntimeCall::CreateLayer);
    }
}
