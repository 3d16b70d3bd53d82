// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Extension names, system capabilities and runtime preferences.

/// `XR_FB_passthrough`; required for any passthrough functionality.
pub const FB_PASSTHROUGH_EXTENSION_NAME: &str = "XR_FB_passthrough";
/// `XR_FB_triangle_mesh`; required for projected geometry.
pub const FB_TRIANGLE_MESH_EXTENSION_NAME: &str = "XR_FB_triangle_mesh";
/// `XR_META_passthrough_preferences`.
pub const META_PASSTHROUGH_PREFERENCES_EXTENSION_NAME: &str = "XR_META_passthrough_preferences";
/// `XR_META_passthrough_color_lut`.
pub const META_PASSTHROUGH_COLOR_LUT_EXTENSION_NAME: &str = "XR_META_passthrough_color_lut";

/// Which of the requested extensions the runtime enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnabledExtensions {
    /// `XR_FB_passthrough`.
    pub fb_passthrough: bool,
    /// `XR_FB_triangle_mesh`.
    pub fb_triangle_mesh: bool,
    /// `XR_META_passthrough_preferences`.
    pub meta_passthrough_preferences: bool,
    /// `XR_META_passthrough_color_lut`.
    pub meta_passthrough_color_lut: bool,
}

impl EnabledExtensions {
    /// Everything enabled.
    pub const fn all() -> Self {
        Self {
            fb_passthrough: true,
            fb_triangle_mesh: true,
            meta_passthrough_preferences: true,
            meta_passthrough_color_lut: true,
        }
    }

    /// Builds the set from a list of extension names.
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut enabled = Self::default();
        for name in names {
            match name {
                FB_PASSTHROUGH_EXTENSION_NAME => enabled.fb_passthrough = true,
                FB_TRIANGLE_MESH_EXTENSION_NAME => enabled.fb_triangle_mesh = true,
                META_PASSTHROUGH_PREFERENCES_EXTENSION_NAME => {
                    enabled.meta_passthrough_preferences = true;
                }
                META_PASSTHROUGH_COLOR_LUT_EXTENSION_NAME => {
                    enabled.meta_passthrough_color_lut = true;
                }
                _ => {}
            }
        }
        enabled
    }
}

/// Passthrough capability bits (`XrPassthroughCapabilityFlagsFB`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PassthroughCapabilities(pub u64);

impl PassthroughCapabilities {
    /// `XR_PASSTHROUGH_CAPABILITY_BIT_FB`.
    pub const PASSTHROUGH: PassthroughCapabilities = PassthroughCapabilities(0x1);
    /// `XR_PASSTHROUGH_CAPABILITY_COLOR_BIT_FB`.
    pub const COLOR: PassthroughCapabilities = PassthroughCapabilities(0x2);
    /// `XR_PASSTHROUGH_CAPABILITY_LAYER_DEPTH_BIT_FB`.
    pub const LAYER_DEPTH: PassthroughCapabilities = PassthroughCapabilities(0x4);

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: PassthroughCapabilities) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bitwise union.
    pub const fn union(self, other: PassthroughCapabilities) -> PassthroughCapabilities {
        PassthroughCapabilities(self.0 | other.0)
    }
}

/// System properties chained into `xrGetSystemProperties`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassthroughSystemProperties {
    /// `XrSystemPassthroughProperties2FB::capabilities`.
    pub capabilities: PassthroughCapabilities,
    /// `XrSystemPassthroughColorLutPropertiesMETA::maxColorLutResolution`.
    pub max_color_lut_resolution: u32,
}

/// Runtime passthrough preference bits (`XrPassthroughPreferenceFlagsMETA`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PassthroughPreferences(pub u64);

impl PassthroughPreferences {
    /// `XR_PASSTHROUGH_PREFERENCE_DEFAULT_TO_ACTIVE_BIT_META`.
    pub const DEFAULT_TO_ACTIVE: PassthroughPreferences = PassthroughPreferences(0x1);

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: PassthroughPreferences) -> bool {
        self.0 & other.0 == other.0
    }
}
